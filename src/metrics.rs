// Classification metrics computed from a confusion matrix: accuracy, per-class
// precision / recall / F1 and their macro average.
use std::fmt;

use ndarray::Array2;
use serde::Serialize;

use crate::codec::SleepQuality;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: SleepQuality,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_f1: f64,
    /// Rows are true classes, columns predicted classes.
    pub confusion: Array2<usize>,
}

// 0/0 counts as 0, matching the usual zero_division default
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn confusion_matrix(truth: &[usize], predicted: &[usize], n_classes: usize) -> Array2<usize> {
    let mut cm = Array2::<usize>::zeros((n_classes, n_classes));
    for (&t, &p) in truth.iter().zip(predicted) {
        if t < n_classes && p < n_classes {
            cm[(t, p)] += 1;
        }
    }
    cm
}

pub fn accuracy(truth: &[usize], predicted: &[usize]) -> f64 {
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    ratio(correct, truth.len())
}

impl ClassificationReport {
    /// `classes[k]` names code `k`.
    pub fn new(truth: &[usize], predicted: &[usize], classes: &[SleepQuality]) -> Self {
        let k = classes.len();
        let confusion = confusion_matrix(truth, predicted, k);

        let per_class: Vec<ClassMetrics> = classes
            .iter()
            .enumerate()
            .map(|(c, &label)| {
                let tp = confusion[(c, c)];
                let support = confusion.row(c).sum();
                let predicted_c = confusion.column(c).sum();
                let precision = ratio(tp, predicted_c);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics { label, precision, recall, f1, support }
            })
            .collect();

        // averaged over classes that occur in either the truth or the predictions
        let present: Vec<f64> = per_class
            .iter()
            .enumerate()
            .filter(|(c, m)| m.support > 0 || confusion.column(*c).sum() > 0)
            .map(|(_, m)| m.f1)
            .collect();
        let macro_f1 = if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        };

        Self {
            per_class,
            accuracy: accuracy(truth, predicted),
            macro_f1,
            confusion,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.label.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        let total: usize = self.per_class.iter().map(|m| m.support).sum();
        writeln!(f)?;
        writeln!(f, "{:>12} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy, total)?;
        writeln!(f, "{:>12} {:>9} {:>9} {:>9.2} {:>9}", "macro avg f1", "", "", self.macro_f1, total)?;
        writeln!(f)?;
        writeln!(f, "Confusion Matrix:")?;
        for row in self.confusion.rows() {
            let cells: Vec<String> = row.iter().map(|n| format!("{:>5}", n)).collect();
            writeln!(f, "[{}]", cells.join(""))?;
        }
        Ok(())
    }
}
