//! Model selection: split once, fit every candidate pipeline on the training
//! part, score it on the held-out part and keep the best by macro-F1.
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::codec::{LabelCodec, SleepQuality};
use crate::config::TrainingConfig;
use crate::error::{Error, Result};
use crate::features::{self, FeatureRow};
use crate::io;
use crate::metrics::ClassificationReport;
use crate::model::ClassifierKind;
use crate::pipeline::SleepPipeline;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub kind: ClassifierKind,
    pub f1_macro: f64,
    pub accuracy: f64,
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub pipeline: SleepPipeline,
    pub codec: LabelCodec,
    /// One entry per candidate, in evaluation order.
    pub scores: Vec<CandidateScore>,
    /// Held-out report of the selected pipeline.
    pub report: ClassificationReport,
}

impl TrainingOutcome {
    pub fn selected(&self) -> ClassifierKind {
        self.pipeline.kind()
    }

    pub fn selected_score(&self) -> Option<&CandidateScore> {
        let kind = self.selected();
        self.scores.iter().find(|s| s.kind == kind)
    }
}

/// Train / test indices, stratified by class code. Each class contributes
/// `round(n_c * test_fraction)` rows to the test side but always keeps at
/// least one row for training.
pub fn stratified_split(labels: &[usize], test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    let n_classes = labels.iter().max().map_or(0, |m| m + 1);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in 0..n_classes {
        let mut members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        if members.is_empty() {
            continue;
        }
        members.shuffle(&mut rng);
        let n_test = ((members.len() as f64 * test_fraction).round() as usize).min(members.len() - 1);
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    if test.is_empty() {
        return Err(Error::Config(format!(
            "test_fraction {} leaves no rows to evaluate on",
            test_fraction
        )));
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Index of the winning candidate: strictly higher macro-F1 wins, an exact
/// tie goes to the simpler model.
pub fn select_best(scores: &[CandidateScore]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, s) in scores.iter().enumerate() {
        best = match best {
            None => Some(i),
            Some(b) => {
                let current = &scores[b];
                let better = s.f1_macro > current.f1_macro
                    || (s.f1_macro == current.f1_macro && s.kind.complexity() < current.kind.complexity());
                if better {
                    Some(i)
                } else {
                    Some(b)
                }
            }
        };
    }
    best
}

fn pick<T: Clone>(items: &[T], idx: &[usize]) -> Vec<T> {
    idx.iter().map(|&i| items[i].clone()).collect()
}

pub fn train(rows: &[FeatureRow], labels: &[SleepQuality], config: &TrainingConfig) -> Result<TrainingOutcome> {
    config.validate()?;
    if rows.is_empty() {
        return Err(Error::EmptyDataset);
    }
    if rows.len() != labels.len() {
        return Err(Error::Config(format!(
            "{} rows but {} labels",
            rows.len(),
            labels.len()
        )));
    }

    // 1) Label codec on the full label column
    let codec = LabelCodec::fit(labels);
    if codec.n_classes() < 2 {
        return Err(Error::TooFewClasses { found: codec.n_classes() });
    }
    let encoded = codec.encode_all(labels)?;

    // 2) Stratified holdout
    let (train_idx, test_idx) = stratified_split(&encoded, config.test_fraction, config.seed)?;
    let train_rows = pick(rows, &train_idx);
    let train_y = pick(&encoded, &train_idx);
    let test_rows = pick(rows, &test_idx);
    let test_y = pick(&encoded, &test_idx);
    log::info!(
        "Training on {} rows, evaluating on {} rows ({} classes)",
        train_rows.len(),
        test_rows.len(),
        codec.n_classes()
    );

    // 3) + 4) Fit every candidate, keep the best as we go
    let mut scores = Vec::with_capacity(config.candidates.len());
    let mut best: Option<(SleepPipeline, ClassificationReport)> = None;
    for &kind in &config.candidates {
        let pipeline = SleepPipeline::fit(kind, config, &train_rows, &train_y)?;
        let preds = pipeline.predict(&test_rows).to_vec();
        let report = ClassificationReport::new(&test_y, &preds, codec.classes());
        log::info!("[{}] f1_macro={:.4} acc={:.4}", kind, report.macro_f1, report.accuracy);
        scores.push(CandidateScore {
            kind,
            f1_macro: report.macro_f1,
            accuracy: report.accuracy,
        });

        if select_best(&scores) == Some(scores.len() - 1) {
            best = Some((pipeline, report));
        }
    }

    let (pipeline, report) = best.ok_or_else(|| Error::Config("no candidate was trained".into()))?;
    log::info!("Best model: {} f1: {:.4}", pipeline.kind(), report.macro_f1);
    log::debug!("Feature columns: {}", pipeline.preprocessor.feature_names().join(", "));

    Ok(TrainingOutcome { pipeline, codec, scores, report })
}

/// Loads and validates a csv file, then runs [`train`].
pub fn train_from_csv(path: impl AsRef<Path>, config: &TrainingConfig) -> Result<TrainingOutcome> {
    let table = io::load_csv(path)?;
    let (rows, labels) = features::prepare_training_table(&table)?;
    train(&rows, &labels, config)
}
