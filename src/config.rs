//! Training configuration. Every field has a default so a partial JSON file
//! (or none at all) is enough to run.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ClassifierKind;

pub const DEFAULT_DATA_PATH: &str = "data/sleep_data.csv";
pub const DEFAULT_MODEL_PATH: &str = "models/sleep_model_v1.json";
pub const DEFAULT_SYNTHETIC_ROWS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    /// Share of feature columns each tree sees.
    pub max_features_fraction: f64,
    pub max_depth: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_features_fraction: 0.7,
            max_depth: Some(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self { max_depth: Some(20) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticParams {
    pub max_iterations: u64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self { max_iterations: 1000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmParams {
    pub c: f64,
    /// Gaussian kernel width; `None` uses the number of feature columns.
    pub kernel_eps: Option<f64>,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self { c: 1.0, kernel_eps: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub test_fraction: f64,
    pub seed: u64,
    /// Candidates in evaluation order.
    pub candidates: Vec<ClassifierKind>,
    pub forest: ForestParams,
    pub tree: TreeParams,
    pub logistic: LogisticParams,
    pub svm: SvmParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            candidates: ClassifierKind::ALL.to_vec(),
            forest: ForestParams::default(),
            tree: TreeParams::default(),
            logistic: LogisticParams::default(),
            svm: SvmParams::default(),
        }
    }
}

impl TrainingConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(Error::Config(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.candidates.is_empty() {
            return Err(Error::Config("at least one candidate is required".into()));
        }
        if self.forest.n_trees == 0 {
            return Err(Error::Config("forest.n_trees must be at least 1".into()));
        }
        let frac = self.forest.max_features_fraction;
        if !(frac > 0.0 && frac <= 1.0) {
            return Err(Error::Config(format!(
                "forest.max_features_fraction must be in (0, 1], got {}",
                frac
            )));
        }
        if self.svm.c <= 0.0 || self.svm.kernel_eps.is_some_and(|eps| eps <= 0.0) {
            return Err(Error::Config("svm.c and svm.kernel_eps must be positive".into()));
        }
        Ok(())
    }
}
