//! Model bundle persistence: the fitted pipeline and label codec live in one
//! JSON file, replaced wholesale on every save.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::LabelCodec;
use crate::error::{Error, Result};
use crate::pipeline::SleepPipeline;
use crate::train::TrainingOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleInfo {
    pub model: String,
    pub f1_macro: f64,
    pub accuracy: f64,
    pub trained_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelBundle {
    pub pipeline: SleepPipeline,
    pub label_codec: LabelCodec,
    pub info: BundleInfo,
}

impl From<TrainingOutcome> for ModelBundle {
    fn from(outcome: TrainingOutcome) -> Self {
        let info = BundleInfo {
            model: outcome.selected().name().to_string(),
            f1_macro: outcome.report.macro_f1,
            accuracy: outcome.report.accuracy,
            trained_at: Utc::now(),
        };
        Self {
            pipeline: outcome.pipeline,
            label_codec: outcome.codec,
            info,
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl ModelBundle {
    /// Writes next to `path` first and renames over it, so readers only ever
    /// see a complete bundle.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = temp_path(path);
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        log::info!("Saved {} model to {}", self.info.model, path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ModelNotFound { path: path.to_path_buf() },
            _ => Error::Io(e),
        })?;
        let bundle: Self = serde_json::from_reader(BufReader::new(file))?;
        log::debug!("Loaded {} model trained at {}", bundle.info.model, bundle.info.trained_at);
        Ok(bundle)
    }
}
