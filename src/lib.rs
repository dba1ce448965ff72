//! Sleep quality prediction: feature preparation, model selection over a
//! fixed set of classifiers, bundle persistence and inference with tips.
pub mod codec;
pub mod config;
pub mod error;
pub mod features;
pub mod forest;
pub mod io;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod predict;
pub mod preprocess;
pub mod report;
pub mod store;
pub mod synth;
pub mod tips;
pub mod train;

pub use codec::{LabelCodec, SleepQuality};
pub use config::TrainingConfig;
pub use error::{Error, Result};
pub use features::{FeatureRow, SleepInput};
pub use model::{Classifier, ClassifierKind};
pub use predict::{predict, Prediction, Predictor};
pub use store::ModelBundle;
pub use train::{train, train_from_csv, TrainingOutcome};
