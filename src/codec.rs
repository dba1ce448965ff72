//! Sleep quality labels and the integer codes the classifiers work with.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Target label. Variants are declared in name order so `Ord` matches
/// sorting the class names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SleepQuality {
    Average,
    Good,
    Poor,
}

impl SleepQuality {
    pub const ALL: [SleepQuality; 3] = [SleepQuality::Average, SleepQuality::Good, SleepQuality::Poor];

    pub fn as_str(&self) -> &'static str {
        match self {
            SleepQuality::Average => "Average",
            SleepQuality::Good => "Good",
            SleepQuality::Poor => "Poor",
        }
    }
}

impl FromStr for SleepQuality {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "Average" => Ok(SleepQuality::Average),
            "Good" => Ok(SleepQuality::Good),
            "Poor" => Ok(SleepQuality::Poor),
            other => Err(format!("Unknown sleep quality: {}", other)),
        }
    }
}

impl fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bidirectional label <-> code mapping, fit once from the training labels
/// and frozen inside the model bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCodec {
    classes: Vec<SleepQuality>,
}

impl LabelCodec {
    /// Sorted distinct labels become codes `0..k`.
    pub fn fit(labels: &[SleepQuality]) -> Self {
        let mut classes = labels.to_vec();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[SleepQuality] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: SleepQuality) -> Result<usize> {
        self.classes
            .binary_search(&label)
            .map_err(|_| Error::UnknownLabel { label })
    }

    pub fn encode_all(&self, labels: &[SleepQuality]) -> Result<Vec<usize>> {
        labels.iter().map(|&l| self.encode(l)).collect()
    }

    /// Fails on a code the codec never produced, which means the bundle
    /// and the classifier disagree on the class count.
    pub fn decode(&self, code: usize) -> Result<SleepQuality> {
        self.classes.get(code).copied().ok_or(Error::LabelOutOfRange {
            code,
            classes: self.classes.len(),
        })
    }
}
