//! Candidate classifiers. A closed set of model families behind one capability trait,
//! each fit on the already-preprocessed feature matrix.
use std::fmt;

use linfa::prelude::*;
use linfa_logistic::{MultiFittedLogisticRegression, MultiLogisticRegression};
use linfa_svm::Svm;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::config::{SvmParams, TrainingConfig};
use crate::error::{Error, Result};
use crate::forest::BaggedTrees;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    BaggedTrees,
    LogisticRegression,
    DecisionTree,
    SupportVector,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 4] = [
        ClassifierKind::BaggedTrees,
        ClassifierKind::LogisticRegression,
        ClassifierKind::DecisionTree,
        ClassifierKind::SupportVector,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ClassifierKind::BaggedTrees => "RandomForest",
            ClassifierKind::LogisticRegression => "LogisticRegression",
            ClassifierKind::DecisionTree => "DecisionTree",
            ClassifierKind::SupportVector => "SVC",
        }
    }

    /// Rank used to break exact score ties: lower is simpler.
    pub fn complexity(&self) -> u8 {
        match self {
            ClassifierKind::LogisticRegression => 0,
            ClassifierKind::DecisionTree => 1,
            ClassifierKind::SupportVector => 2,
            ClassifierKind::BaggedTrees => 3,
        }
    }

    /// Fits this model family on a numeric matrix and encoded labels.
    pub fn fit(&self, config: &TrainingConfig, x: &Array2<f64>, y: &Array1<usize>) -> Result<FittedClassifier> {
        let fit_err = |e: &dyn fmt::Display| Error::Fit {
            model: *self,
            reason: e.to_string(),
        };
        let fitted = match self {
            ClassifierKind::BaggedTrees => {
                FittedClassifier::BaggedTrees(BaggedTrees::fit(&config.forest, config.seed, x, y)?)
            }
            ClassifierKind::LogisticRegression => {
                let model = MultiLogisticRegression::default()
                    .max_iterations(config.logistic.max_iterations)
                    .fit(&Dataset::new(x.clone(), y.clone()))
                    .map_err(|e| fit_err(&e))?;
                FittedClassifier::LogisticRegression(model)
            }
            ClassifierKind::DecisionTree => {
                let model = DecisionTree::params()
                    .max_depth(config.tree.max_depth)
                    .fit(&Dataset::new(x.clone(), y.clone()))
                    .map_err(|e| fit_err(&e))?;
                FittedClassifier::DecisionTree(model)
            }
            ClassifierKind::SupportVector => FittedClassifier::SupportVector(OneVsRestSvm::fit(&config.svm, x, y)?),
        };
        Ok(fitted)
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What every candidate can do once fitted. `predict_confidence` is the
/// probability of the predicted class, or `None` for models without one.
pub trait Classifier {
    fn predict(&self, x: &Array2<f64>) -> Array1<usize>;
    fn predict_confidence(&self, x: &Array2<f64>) -> Option<Array1<f64>>;
}

/// One binary SVM per class with Platt-scaled outputs, renormalised across classes.
#[derive(Debug, Serialize, Deserialize)]
pub struct OneVsRestSvm {
    models: Vec<Svm<f64, Pr>>,
}

impl OneVsRestSvm {
    pub fn fit(params: &SvmParams, x: &Array2<f64>, y: &Array1<usize>) -> Result<Self> {
        let n_classes = y.iter().max().map_or(0, |m| m + 1);
        let eps = params.kernel_eps.unwrap_or(x.ncols().max(1) as f64);
        let svm_params = Svm::<_, Pr>::params()
            .gaussian_kernel(eps)
            .pos_neg_weights(params.c, params.c);

        let models = (0..n_classes)
            .map(|class| {
                let targets: Array1<bool> = y.mapv(|c| c == class);
                svm_params
                    .fit(&Dataset::new(x.clone(), targets))
                    .map_err(|e| Error::Fit {
                        model: ClassifierKind::SupportVector,
                        reason: format!("class {}: {}", class, e),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { models })
    }

    /// Class probabilities, one column per class code, rows summing to 1.
    pub fn probabilities(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut probs = Array2::<f64>::zeros((x.nrows(), self.models.len()));
        for (class, model) in self.models.iter().enumerate() {
            let pr: Array1<Pr> = model.predict(x);
            for (i, p) in pr.iter().enumerate() {
                probs[(i, class)] = f64::from(**p);
            }
        }
        let k = self.models.len().max(1) as f64;
        for mut row in probs.axis_iter_mut(Axis(0)) {
            let total = row.sum();
            if total > 0.0 {
                row /= total;
            } else {
                row.fill(1.0 / k);
            }
        }
        probs
    }
}

fn argmax_rows(probs: &Array2<f64>) -> Array1<usize> {
    probs
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (i, &p)| if p > best.1 { (i, p) } else { best })
                .0
        })
        .collect()
}

fn max_rows(probs: &Array2<f64>) -> Array1<f64> {
    probs
        .rows()
        .into_iter()
        .map(|row| row.iter().copied().fold(0.0, f64::max))
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub enum FittedClassifier {
    BaggedTrees(BaggedTrees),
    LogisticRegression(MultiFittedLogisticRegression<f64, usize>),
    DecisionTree(DecisionTree<f64, usize>),
    SupportVector(OneVsRestSvm),
}

impl FittedClassifier {
    pub fn kind(&self) -> ClassifierKind {
        match self {
            FittedClassifier::BaggedTrees(_) => ClassifierKind::BaggedTrees,
            FittedClassifier::LogisticRegression(_) => ClassifierKind::LogisticRegression,
            FittedClassifier::DecisionTree(_) => ClassifierKind::DecisionTree,
            FittedClassifier::SupportVector(_) => ClassifierKind::SupportVector,
        }
    }
}

impl Classifier for FittedClassifier {
    fn predict(&self, x: &Array2<f64>) -> Array1<usize> {
        match self {
            FittedClassifier::BaggedTrees(m) => m.predict(x),
            FittedClassifier::LogisticRegression(m) => m.predict(x),
            FittedClassifier::DecisionTree(m) => m.predict(x),
            FittedClassifier::SupportVector(m) => argmax_rows(&m.probabilities(x)),
        }
    }

    fn predict_confidence(&self, x: &Array2<f64>) -> Option<Array1<f64>> {
        match self {
            FittedClassifier::BaggedTrees(m) => Some(m.predict_confidence(x)),
            FittedClassifier::LogisticRegression(m) => Some(max_rows(&m.predict_probabilities(x))),
            FittedClassifier::DecisionTree(_) => None,
            FittedClassifier::SupportVector(m) => Some(max_rows(&m.probabilities(x))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // three well separated blobs, already on a standardized scale
    fn blobs() -> (Array2<f64>, Array1<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        let centers = [(-2.0, -2.0), (0.0, 2.0), (2.0, -2.0)];
        for (class, (cx, cy)) in centers.iter().enumerate() {
            for k in 0..12 {
                let dx = (k % 4) as f64 * 0.1 - 0.15;
                let dy = (k / 4) as f64 * 0.1 - 0.1;
                rows.push([cx + dx, cy + dy]);
                labels.push(class);
            }
        }
        let x = Array2::from_shape_vec((rows.len(), 2), rows.into_iter().flatten().collect()).unwrap();
        (x, Array1::from(labels))
    }

    fn small_config() -> TrainingConfig {
        let mut config = TrainingConfig::default();
        config.forest.n_trees = 15;
        config
    }

    #[test]
    fn every_candidate_separates_blobs() {
        let (x, y) = blobs();
        let probe = array![[-2.0, -2.0], [0.0, 2.0], [2.0, -2.0]];
        for kind in ClassifierKind::ALL {
            let model = kind.fit(&small_config(), &x, &y).unwrap();
            assert_eq!(model.kind(), kind);
            assert_eq!(model.predict(&probe), array![0, 1, 2], "{} misclassified", kind);
        }
    }

    #[test]
    fn confidence_is_absent_only_for_single_tree() {
        let (x, y) = blobs();
        let probe = array![[0.1, 1.9]];
        for kind in ClassifierKind::ALL {
            let model = kind.fit(&small_config(), &x, &y).unwrap();
            match model.predict_confidence(&probe) {
                Some(conf) => {
                    assert_ne!(kind, ClassifierKind::DecisionTree);
                    assert!((0.0..=1.0).contains(&conf[0]), "{} gave {}", kind, conf[0]);
                }
                None => assert_eq!(kind, ClassifierKind::DecisionTree),
            }
        }
    }

    #[test]
    fn svm_probabilities_sum_to_one() {
        let (x, y) = blobs();
        let svm = OneVsRestSvm::fit(&SvmParams::default(), &x, &y).unwrap();
        let probs = svm.probabilities(&x);
        assert_eq!(probs.ncols(), 3);
        for row in probs.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn non_finite_input_is_a_fit_error() {
        let x = array![[0.0, 1.0], [f64::NAN, 1.5], [3.0, 0.0], [3.5, 0.5]];
        let y = array![0, 0, 1, 1];
        match ClassifierKind::LogisticRegression.fit(&small_config(), &x, &y) {
            Err(Error::Fit { model, reason }) => {
                assert_eq!(model, ClassifierKind::LogisticRegression);
                assert!(!reason.is_empty());
            }
            other => panic!("expected a fit error, got {:?}", other.map(|m| m.kind())),
        }
    }

    #[test]
    fn simpler_models_rank_lower() {
        assert!(ClassifierKind::LogisticRegression.complexity() < ClassifierKind::DecisionTree.complexity());
        assert!(ClassifierKind::DecisionTree.complexity() < ClassifierKind::SupportVector.complexity());
        assert!(ClassifierKind::SupportVector.complexity() < ClassifierKind::BaggedTrees.complexity());
    }
}
