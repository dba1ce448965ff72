// Module for loading and saving the sleep data. It reads the csv file, keeps the header row
// for column validation, and skips rows that cannot be read.
use std::fs::{self, File};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::Result;

/// One observation as it appears in the csv file. Every column is optional
/// here; which ones are required is decided by `features::prepare_table`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub bedtime: Option<String>,
    pub wakeup_time: Option<String>,
    #[serde(serialize_with = "whole_number")]
    pub bedtime_minutes: Option<f64>,
    #[serde(serialize_with = "whole_number")]
    pub wakeup_minutes: Option<f64>,
    pub sleep_duration: Option<f64>,
    pub caffeine_intake: Option<String>,
    #[serde(serialize_with = "whole_number")]
    pub exercise_duration: Option<f64>,
    #[serde(serialize_with = "whole_number")]
    pub screen_time_before_bed: Option<f64>,
    #[serde(serialize_with = "whole_number")]
    pub stress_level: Option<f64>,
    pub mood: Option<String>,
    pub sleep_interruptions: Option<String>,
    pub sleep_quality: Option<String>,
}

/// Integer-valued columns are written without a fractional part.
fn whole_number<S: Serializer>(value: &Option<f64>, s: S) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(v) if v.is_finite() && v.fract() == 0.0 => s.serialize_some(&(*v as i64)),
        other => other.serialize(s),
    }
}

/// Rows plus the header they were read with.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

pub fn load_csv(path: impl AsRef<Path>) -> Result<RawTable> {
    let file = File::open(path.as_ref())?;
    let mut rdr = ReaderBuilder::new()
        .delimiter(b',')
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    // Grab and own the header row
    let headers = rdr.headers()?.clone();
    let expected_len = headers.len();
    let columns = headers.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for result in rdr.records() {
        let raw: StringRecord = result?;
        let line = raw.position().map(|p| p.line()).unwrap_or(0);

        // 1) Skip completely empty lines
        if raw.iter().all(|f| f.is_empty()) {
            continue;
        }

        // 2) Skip rows with the wrong number of fields
        if raw.len() != expected_len {
            log::warn!(
                "Skipping line {}: expected {} fields, found {}",
                line,
                expected_len,
                raw.len(),
            );
            continue;
        }

        // 3) Attempt to deserialize; if it fails, skip that row
        match raw.deserialize::<RawRecord>(Some(&headers)) {
            Ok(rec) => records.push(rec),
            Err(e) => log::warn!("Skipping malformed record at line {}: {}", line, e),
        }
    }

    log::info!("Loaded {} records from {}", records.len(), path.as_ref().display());
    Ok(RawTable { columns, records })
}

/// Writes records with the full column header, creating parent directories.
pub fn write_csv(path: impl AsRef<Path>, records: &[RawRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut wtr = WriterBuilder::new().has_headers(true).from_path(path)?;
    for rec in records {
        wtr.serialize(rec)?;
    }
    wtr.flush()?;
    Ok(())
}
