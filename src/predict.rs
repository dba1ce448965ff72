//! Inference: one raw input in, label plus optional confidence plus tips out.
use std::path::Path;

use serde::Serialize;

use crate::codec::SleepQuality;
use crate::error::{Error, Result};
use crate::features::{self, SleepInput};
use crate::store::ModelBundle;
use crate::tips;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: SleepQuality,
    /// Probability of the predicted class; `None` when the selected model
    /// has no calibrated scores.
    pub confidence: Option<f64>,
    pub tips: Vec<String>,
}

/// Holds a loaded bundle read-only; every call goes through the same
/// fitted transform.
#[derive(Debug)]
pub struct Predictor {
    bundle: ModelBundle,
}

impl Predictor {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        ModelBundle::load(path).map(Self::from_bundle)
    }

    pub fn from_bundle(bundle: ModelBundle) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn predict(&self, input: &SleepInput) -> Result<Prediction> {
        let row = features::prepare_input(input);
        let rows = std::slice::from_ref(&row);
        let (codes, confidence) = self.bundle.pipeline.predict_with_confidence(rows);

        let code = codes.first().copied().ok_or(Error::EmptyDataset)?;
        let label = self.bundle.label_codec.decode(code)?;
        let confidence = confidence.and_then(|c| c.first().copied());
        log::debug!("Predicted {} (code {}) confidence {:?}", label, code, confidence);

        Ok(Prediction {
            label,
            confidence,
            tips: tips::tips(&row).map(str::to_string).collect(),
        })
    }
}

/// Loads the bundle at `model_path` and predicts a single input.
pub fn predict(input: &SleepInput, model_path: impl AsRef<Path>) -> Result<Prediction> {
    Predictor::load(model_path)?.predict(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;
    use crate::features::prepare_training_table;
    use crate::io::RawTable;
    use crate::model::ClassifierKind;
    use crate::{synth, train};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::error::Error as StdError;
    use tempfile::tempdir;

    fn reference_input() -> SleepInput {
        SleepInput {
            bedtime: Some("23:30".into()),
            wakeup_time: Some("07:00".into()),
            sleep_duration: Some(7.5),
            caffeine_intake: Some("Low".into()),
            exercise_duration: Some(40),
            screen_time_before_bed: Some(30),
            stress_level: Some(3),
            mood: Some("Happy".into()),
            sleep_interruptions: Some("No".into()),
        }
    }

    fn trained_bundle(kind: Option<ClassifierKind>) -> Result<ModelBundle, Box<dyn StdError>> {
        let mut rng = StdRng::seed_from_u64(42);
        let table = RawTable {
            columns: synth::COLUMNS.iter().map(|c| c.to_string()).collect(),
            records: synth::generate_rows(600, &mut rng)?,
        };
        let (rows, labels) = prepare_training_table(&table)?;
        let mut config = TrainingConfig::default();
        config.forest.n_trees = 20;
        if let Some(kind) = kind {
            config.candidates = vec![kind];
        }
        Ok(ModelBundle::from(train::train(&rows, &labels, &config)?))
    }

    #[test]
    fn end_to_end_train_save_predict() -> Result<(), Box<dyn StdError>> {
        let dir = tempdir()?;
        let path = dir.path().join("models").join("sleep_model_v1.json");
        trained_bundle(None)?.save(&path)?;

        let prediction = predict(&reference_input(), &path)?;
        assert!(SleepQuality::ALL.contains(&prediction.label));
        if let Some(c) = prediction.confidence {
            assert!((0.0..=1.0).contains(&c), "confidence {}", c);
        }
        assert_eq!(prediction.tips, vec![tips::ALL_GOOD.to_string()]);
        Ok(())
    }

    #[test]
    fn probabilistic_models_report_confidence() -> Result<(), Box<dyn StdError>> {
        let predictor = Predictor::from_bundle(trained_bundle(Some(ClassifierKind::LogisticRegression))?);
        assert_eq!(predictor.bundle().info.model, "LogisticRegression");
        let c = predictor.predict(&reference_input())?.confidence.unwrap();
        assert!(c > 0.0 && c <= 1.0);

        let predictor = Predictor::from_bundle(trained_bundle(Some(ClassifierKind::DecisionTree))?);
        assert_eq!(predictor.predict(&reference_input())?.confidence, None);
        Ok(())
    }

    #[test]
    fn missing_fields_still_predict() -> Result<(), Box<dyn StdError>> {
        let predictor = Predictor::from_bundle(trained_bundle(Some(ClassifierKind::LogisticRegression))?);
        let input = SleepInput {
            mood: None,
            caffeine_intake: Some("Espresso".into()),
            bedtime: Some("late".into()),
            ..reference_input()
        };
        let prediction = predictor.predict(&input)?;
        assert!(SleepQuality::ALL.contains(&prediction.label));

        let empty = predictor.predict(&SleepInput::default())?;
        assert!(empty.tips.contains(&tips::SLEEP_MORE.to_string()));
        Ok(())
    }

    #[test]
    fn missing_artifact_says_train_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = predict(&reference_input(), &path).unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { .. }));
        assert!(err.to_string().contains("Train first"));
    }
}
