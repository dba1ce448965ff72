//! Feature preparation: turns raw csv rows or a single form submission into
//! the canonical [`FeatureRow`] the preprocessing pipeline consumes.
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::codec::SleepQuality;
use crate::error::{Error, Result};
use crate::io::{RawRecord, RawTable};

pub const NUMERIC_FEATURES: [&str; 6] = [
    "sleep_duration",
    "exercise_duration",
    "screen_time_before_bed",
    "stress_level",
    "bedtime_minutes",
    "wakeup_minutes",
];

pub const CATEGORICAL_FEATURES: [&str; 3] = ["caffeine_intake", "mood", "sleep_interruptions"];

pub const LABEL_COLUMN: &str = "sleep_quality";

pub const DEFAULT_BEDTIME: &str = "23:00";
pub const DEFAULT_WAKEUP_TIME: &str = "07:00";
pub const DEFAULT_CAFFEINE: &str = "Low";
pub const DEFAULT_MOOD: &str = "Neutral";
pub const DEFAULT_INTERRUPTIONS: &str = "No";

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Canonical feature row. `None` marks a value left for the imputer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub sleep_duration: Option<f64>,
    pub exercise_duration: Option<f64>,
    pub screen_time_before_bed: Option<f64>,
    pub stress_level: Option<f64>,
    pub bedtime_minutes: Option<u32>,
    pub wakeup_minutes: Option<u32>,
    pub caffeine_intake: Option<String>,
    pub mood: Option<String>,
    pub sleep_interruptions: Option<String>,
}

impl FeatureRow {
    /// Numeric values in [`NUMERIC_FEATURES`] order.
    pub fn numeric(&self) -> [Option<f64>; 6] {
        [
            self.sleep_duration,
            self.exercise_duration,
            self.screen_time_before_bed,
            self.stress_level,
            self.bedtime_minutes.map(f64::from),
            self.wakeup_minutes.map(f64::from),
        ]
    }

    /// Categorical values in [`CATEGORICAL_FEATURES`] order.
    pub fn categorical(&self) -> [Option<&str>; 3] {
        [
            self.caffeine_intake.as_deref(),
            self.mood.as_deref(),
            self.sleep_interruptions.as_deref(),
        ]
    }
}

/// A single prediction request. Absent fields fall back to the documented
/// defaults in [`prepare_input`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepInput {
    pub bedtime: Option<String>,
    pub wakeup_time: Option<String>,
    pub sleep_duration: Option<f64>,
    pub caffeine_intake: Option<String>,
    pub exercise_duration: Option<u32>,
    pub screen_time_before_bed: Option<u32>,
    pub stress_level: Option<u8>,
    pub mood: Option<String>,
    pub sleep_interruptions: Option<String>,
}

/// "HH:MM" -> minutes since midnight. Anything unparsable is `None`.
pub fn time_to_minutes(ts: &str) -> Option<u32> {
    NaiveTime::parse_from_str(ts.trim(), "%H:%M")
        .ok()
        .map(|t| t.hour() * 60 + t.minute())
}

fn minutes_from_value(v: f64) -> Option<u32> {
    let m = v.round();
    if m.is_finite() && m >= 0.0 && m < f64::from(MINUTES_PER_DAY) {
        Some(m as u32)
    } else {
        None
    }
}

fn clean_category(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Canonical columns (and optionally the label) the table cannot supply.
/// A minutes column counts as present when its "HH:MM" source is.
pub fn missing_columns(table: &RawTable, with_label: bool) -> Vec<String> {
    let mut missing: Vec<String> = NUMERIC_FEATURES
        .iter()
        .chain(CATEGORICAL_FEATURES.iter())
        .filter(|&&col| {
            let derivable = match col {
                "bedtime_minutes" => table.has_column("bedtime"),
                "wakeup_minutes" => table.has_column("wakeup_time"),
                _ => false,
            };
            !table.has_column(col) && !derivable
        })
        .map(|c| c.to_string())
        .collect();
    if with_label && !table.has_column(LABEL_COLUMN) {
        missing.push(LABEL_COLUMN.to_string());
    }
    missing
}

fn prepare_record(rec: &RawRecord) -> FeatureRow {
    let bedtime_minutes = rec
        .bedtime_minutes
        .and_then(minutes_from_value)
        .or_else(|| rec.bedtime.as_deref().and_then(time_to_minutes));
    let wakeup_minutes = rec
        .wakeup_minutes
        .and_then(minutes_from_value)
        .or_else(|| rec.wakeup_time.as_deref().and_then(time_to_minutes));

    FeatureRow {
        sleep_duration: rec.sleep_duration,
        exercise_duration: rec.exercise_duration,
        screen_time_before_bed: rec.screen_time_before_bed,
        stress_level: rec.stress_level,
        bedtime_minutes,
        wakeup_minutes,
        caffeine_intake: clean_category(rec.caffeine_intake.as_deref()),
        mood: clean_category(rec.mood.as_deref()),
        sleep_interruptions: clean_category(rec.sleep_interruptions.as_deref()),
    }
}

/// Validates the header and converts every row. No defaults are applied:
/// a missing column is fatal, a missing cell is left for the imputer.
pub fn prepare_table(table: &RawTable) -> Result<Vec<FeatureRow>> {
    let missing = missing_columns(table, false);
    if !missing.is_empty() {
        return Err(Error::MissingColumns { missing });
    }
    Ok(table.records.iter().map(prepare_record).collect())
}

/// Like [`prepare_table`] but also requires and parses the label column.
pub fn prepare_training_table(table: &RawTable) -> Result<(Vec<FeatureRow>, Vec<SleepQuality>)> {
    let missing = missing_columns(table, true);
    if !missing.is_empty() {
        return Err(Error::MissingColumns { missing });
    }
    let labels = table
        .records
        .iter()
        .enumerate()
        .map(|(row, rec)| {
            let value = rec.sleep_quality.clone().unwrap_or_default();
            value
                .parse::<SleepQuality>()
                .map_err(|_| Error::InvalidLabel { row, value })
        })
        .collect::<Result<Vec<_>>>()?;
    let rows = table.records.iter().map(prepare_record).collect();
    Ok((rows, labels))
}

/// Single-record preparation for inference; fills absent fields with defaults.
pub fn prepare_input(input: &SleepInput) -> FeatureRow {
    let bedtime = input.bedtime.as_deref().unwrap_or(DEFAULT_BEDTIME);
    let wakeup = input.wakeup_time.as_deref().unwrap_or(DEFAULT_WAKEUP_TIME);

    FeatureRow {
        sleep_duration: Some(input.sleep_duration.unwrap_or(0.0)),
        exercise_duration: Some(f64::from(input.exercise_duration.unwrap_or(0))),
        screen_time_before_bed: Some(f64::from(input.screen_time_before_bed.unwrap_or(0))),
        stress_level: Some(f64::from(input.stress_level.unwrap_or(0))),
        bedtime_minutes: time_to_minutes(bedtime),
        wakeup_minutes: time_to_minutes(wakeup),
        caffeine_intake: clean_category(Some(
            input.caffeine_intake.as_deref().unwrap_or(DEFAULT_CAFFEINE),
        )),
        mood: clean_category(Some(input.mood.as_deref().unwrap_or(DEFAULT_MOOD))),
        sleep_interruptions: clean_category(Some(
            input
                .sleep_interruptions
                .as_deref()
                .unwrap_or(DEFAULT_INTERRUPTIONS),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], records: Vec<RawRecord>) -> RawTable {
        RawTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }

    const FULL: [&str; 10] = [
        "bedtime",
        "wakeup_time",
        "sleep_duration",
        "caffeine_intake",
        "exercise_duration",
        "screen_time_before_bed",
        "stress_level",
        "mood",
        "sleep_interruptions",
        "sleep_quality",
    ];

    #[test]
    fn converts_clock_times() {
        assert_eq!(time_to_minutes("23:30"), Some(1410));
        assert_eq!(time_to_minutes("07:00"), Some(420));
        assert_eq!(time_to_minutes("00:00"), Some(0));
    }

    #[test]
    fn malformed_times_become_missing() {
        assert_eq!(time_to_minutes("late"), None);
        assert_eq!(time_to_minutes("25:00"), None);
        assert_eq!(time_to_minutes("23"), None);
        assert_eq!(time_to_minutes(""), None);
    }

    #[test]
    fn reports_exactly_the_missing_columns() {
        let cols: Vec<&str> = FULL
            .iter()
            .copied()
            .filter(|c| *c != "mood" && *c != "stress_level" && *c != "wakeup_time")
            .collect();
        match prepare_table(&table(&cols, vec![])) {
            Err(Error::MissingColumns { missing }) => {
                assert_eq!(missing, vec!["stress_level", "wakeup_minutes", "mood"]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn training_table_requires_label_column() {
        let cols: Vec<&str> = FULL.iter().copied().filter(|c| *c != "sleep_quality").collect();
        assert!(prepare_table(&table(&cols, vec![])).is_ok());
        match prepare_training_table(&table(&cols, vec![])) {
            Err(Error::MissingColumns { missing }) => assert_eq!(missing, vec!["sleep_quality"]),
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn minute_columns_take_precedence_over_clock_strings() {
        let mut cols = FULL.to_vec();
        cols.push("bedtime_minutes");
        let rec = RawRecord {
            bedtime: Some("23:30".into()),
            bedtime_minutes: Some(1380.0),
            wakeup_time: Some("bogus".into()),
            ..RawRecord::default()
        };
        let rows = prepare_table(&table(&cols, vec![rec])).unwrap();
        assert_eq!(rows[0].bedtime_minutes, Some(1380));
        assert_eq!(rows[0].wakeup_minutes, None);
    }

    #[test]
    fn bad_labels_are_rejected() {
        let rec = RawRecord {
            sleep_quality: Some("Great".into()),
            ..RawRecord::default()
        };
        match prepare_training_table(&table(&FULL, vec![rec])) {
            Err(Error::InvalidLabel { row, value }) => {
                assert_eq!(row, 0);
                assert_eq!(value, "Great");
            }
            other => panic!("expected InvalidLabel, got {:?}", other),
        }
    }

    #[test]
    fn single_input_gets_defaults() {
        let input = SleepInput {
            sleep_duration: Some(6.0),
            ..SleepInput::default()
        };
        let row = prepare_input(&input);
        assert_eq!(row.mood.as_deref(), Some("Neutral"));
        assert_eq!(row.caffeine_intake.as_deref(), Some("Low"));
        assert_eq!(row.sleep_interruptions.as_deref(), Some("No"));
        assert_eq!(row.bedtime_minutes, Some(23 * 60));
        assert_eq!(row.wakeup_minutes, Some(7 * 60));
        assert_eq!(row.exercise_duration, Some(0.0));
        assert_eq!(row.sleep_duration, Some(6.0));
    }

    #[test]
    fn single_input_keeps_bad_time_as_missing() {
        let input = SleepInput {
            bedtime: Some("midnight".into()),
            ..SleepInput::default()
        };
        assert_eq!(prepare_input(&input).bedtime_minutes, None);
    }
}
