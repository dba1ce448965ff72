//! Preprocessing and classifier fitted together, so the exact transform used
//! at training time travels with the model.
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::error::Result;
use crate::features::FeatureRow;
use crate::model::{Classifier, ClassifierKind, FittedClassifier};
use crate::preprocess::Preprocessor;

#[derive(Debug, Serialize, Deserialize)]
pub struct SleepPipeline {
    pub preprocessor: Preprocessor,
    pub classifier: FittedClassifier,
}

impl SleepPipeline {
    /// Fits a fresh preprocessor on `rows`, then the classifier on its output.
    pub fn fit(kind: ClassifierKind, config: &TrainingConfig, rows: &[FeatureRow], labels: &[usize]) -> Result<Self> {
        let preprocessor = Preprocessor::fit(rows)?;
        let x = preprocessor.transform(rows);
        let y = Array1::from(labels.to_vec());
        let classifier = kind.fit(config, &x, &y)?;
        Ok(Self { preprocessor, classifier })
    }

    pub fn kind(&self) -> ClassifierKind {
        self.classifier.kind()
    }

    pub fn transform(&self, rows: &[FeatureRow]) -> Array2<f64> {
        self.preprocessor.transform(rows)
    }

    pub fn predict(&self, rows: &[FeatureRow]) -> Array1<usize> {
        self.classifier.predict(&self.transform(rows))
    }

    /// Encoded prediction plus confidence when the model has one.
    pub fn predict_with_confidence(&self, rows: &[FeatureRow]) -> (Array1<usize>, Option<Array1<f64>>) {
        let x = self.transform(rows);
        (self.classifier.predict(&x), self.classifier.predict_confidence(&x))
    }
}
