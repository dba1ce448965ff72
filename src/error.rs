// Error type shared by every stage of the training and prediction pipeline.
use std::path::PathBuf;

use crate::codec::SleepQuality;
use crate::model::ClassifierKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("missing expected columns: {missing:?}")]
    MissingColumns { missing: Vec<String> },

    #[error("row {row}: invalid sleep quality label {value:?}")]
    InvalidLabel { row: usize, value: String },

    #[error("training data needs at least 2 distinct labels, found {found}")]
    TooFewClasses { found: usize },

    #[error("no rows to work with")]
    EmptyDataset,

    #[error("column `{column}` has no values to fit on")]
    EmptyColumn { column: String },

    #[error("{model} failed: {reason}")]
    Fit { model: ClassifierKind, reason: String },

    #[error("model not found at {}. Train first.", path.display())]
    ModelNotFound { path: PathBuf },

    #[error("label code {code} out of range for {classes} classes")]
    LabelOutOfRange { code: usize, classes: usize },

    #[error("label {label} was not seen at training time")]
    UnknownLabel { label: SleepQuality },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("plot: {0}")]
    Plot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
