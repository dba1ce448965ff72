// Column transformer fitted on training rows: median impute + standardize for numeric
// features, most-frequent impute + one-hot for categorical features.
use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::{FeatureRow, CATEGORICAL_FEATURES, NUMERIC_FEATURES};

/// Frozen statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub median: f64,
    pub mean: f64,
    pub scale: f64,
}

impl NumericColumn {
    fn transform(&self, value: Option<f64>) -> f64 {
        (value.filter(|v| v.is_finite()).unwrap_or(self.median) - self.mean) / self.scale
    }
}

/// Frozen vocabulary of one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub most_frequent: String,
    /// Sorted categories seen at fit time, one indicator column each.
    pub categories: Vec<String>,
}

impl CategoricalColumn {
    /// Index of the indicator to set, `None` for a category never seen at fit time.
    fn position(&self, value: Option<&str>) -> Option<usize> {
        let value = value.unwrap_or(&self.most_frequent);
        self.categories.iter().position(|c| c == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn fit_numeric(name: &str, column: &[Option<f64>]) -> Result<NumericColumn> {
    let mut present: Vec<f64> = column.iter().flatten().copied().filter(|v| v.is_finite()).collect();
    if present.is_empty() {
        return Err(Error::EmptyColumn { column: name.to_string() });
    }
    let median = median(&mut present);

    // mean / population std after imputation
    let imputed: Vec<f64> = column
        .iter()
        .map(|v| match v {
            Some(x) if x.is_finite() => *x,
            _ => median,
        })
        .collect();
    let n = imputed.len() as f64;
    let mean = imputed.iter().sum::<f64>() / n;
    let var = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    let scale = if std > f64::EPSILON { std } else { 1.0 };

    Ok(NumericColumn { name: name.to_string(), median, mean, scale })
}

fn fit_categorical(name: &str, column: &[Option<&str>]) -> Result<CategoricalColumn> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in column.iter().flatten() {
        *counts.entry(*value).or_insert(0) += 1;
    }
    // ties go to the first category in sorted order
    let most_frequent = counts
        .iter()
        .fold(None, |best: Option<(&str, usize)>, (&cat, &n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((cat, n)),
        })
        .map(|(cat, _)| cat.to_string())
        .ok_or_else(|| Error::EmptyColumn { column: name.to_string() })?;

    Ok(CategoricalColumn {
        name: name.to_string(),
        most_frequent,
        categories: counts.keys().map(|c| c.to_string()).collect(),
    })
}

impl Preprocessor {
    /// Learns imputation values, scaling statistics and category vocabularies.
    pub fn fit(rows: &[FeatureRow]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let numeric_values: Vec<[Option<f64>; 6]> = rows.iter().map(FeatureRow::numeric).collect();
        let categorical_values: Vec<[Option<&str>; 3]> = rows.iter().map(FeatureRow::categorical).collect();

        let numeric = NUMERIC_FEATURES
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let column: Vec<Option<f64>> = numeric_values.iter().map(|r| r[j]).collect();
                fit_numeric(name, &column)
            })
            .collect::<Result<Vec<_>>>()?;

        let categorical = CATEGORICAL_FEATURES
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let column: Vec<Option<&str>> = categorical_values.iter().map(|r| r[j]).collect();
                fit_categorical(name, &column)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { numeric, categorical })
    }

    pub fn n_features(&self) -> usize {
        self.numeric.len() + self.categorical.iter().map(|c| c.categories.len()).sum::<usize>()
    }

    /// Output column names: numeric columns first, then `<column>_<category>` indicators.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric.iter().map(|c| c.name.clone()).collect();
        for col in &self.categorical {
            names.extend(col.categories.iter().map(|cat| format!("{}_{}", col.name, cat)));
        }
        names
    }

    pub fn numeric_columns(&self) -> &[NumericColumn] {
        &self.numeric
    }

    pub fn categorical_columns(&self) -> &[CategoricalColumn] {
        &self.categorical
    }

    /// Purely numeric matrix, one row per input row. Never fails: unseen
    /// categories leave their indicator block at zero.
    pub fn transform(&self, rows: &[FeatureRow]) -> Array2<f64> {
        let mut x = Array2::<f64>::zeros((rows.len(), self.n_features()));
        for (i, row) in rows.iter().enumerate() {
            let numeric = row.numeric();
            for (j, col) in self.numeric.iter().enumerate() {
                let value = numeric[j].filter(|v| v.is_finite());
                x[(i, j)] = col.transform(value);
            }

            let mut offset = self.numeric.len();
            for (col, value) in self.categorical.iter().zip(row.categorical()) {
                if let Some(k) = col.position(value) {
                    x[(i, offset + k)] = 1.0;
                }
                offset += col.categories.len();
            }
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(duration: Option<f64>, caffeine: Option<&str>) -> FeatureRow {
        FeatureRow {
            sleep_duration: duration,
            exercise_duration: Some(30.0),
            screen_time_before_bed: Some(60.0),
            stress_level: Some(4.0),
            bedtime_minutes: Some(1380),
            wakeup_minutes: Some(420),
            caffeine_intake: caffeine.map(str::to_string),
            mood: Some("Happy".into()),
            sleep_interruptions: Some("No".into()),
        }
    }

    fn training_rows() -> Vec<FeatureRow> {
        vec![
            row(Some(6.0), Some("Low")),
            row(Some(7.0), Some("Low")),
            row(Some(8.0), Some("None")),
            row(Some(9.0), Some("High")),
        ]
    }

    #[test]
    fn numeric_columns_are_standardized() {
        let pre = Preprocessor::fit(&training_rows()).unwrap();
        let x = pre.transform(&training_rows());
        let col = x.column(0);
        assert_relative_eq!(col.sum(), 0.0, epsilon = 1e-9);
        let var = col.mapv(|v| v * v).sum() / col.len() as f64;
        assert_relative_eq!(var, 1.0, epsilon = 1e-9);
        // constant columns keep scale 1 and become 0
        assert_relative_eq!(x[(0, 1)], 0.0);
    }

    #[test]
    fn missing_values_use_fitted_median_and_mode() {
        let mut rows = training_rows();
        rows.push(row(None, None));
        let pre = Preprocessor::fit(&rows).unwrap();

        let duration = &pre.numeric_columns()[0];
        assert_relative_eq!(duration.median, 7.5);
        let caffeine = &pre.categorical_columns()[0];
        assert_eq!(caffeine.most_frequent, "Low");
        assert_eq!(caffeine.categories, vec!["High", "Low", "None"]);

        let x = pre.transform(&[row(None, None)]);
        assert_relative_eq!(x[(0, 0)], (7.5 - duration.mean) / duration.scale);
        let nan = pre.transform(&[row(Some(f64::NAN), None)]);
        assert_relative_eq!(nan[(0, 0)], x[(0, 0)]);
        // caffeine block starts right after the 6 numeric columns: High, Low, None
        assert_eq!(x[(0, 6)], 0.0);
        assert_eq!(x[(0, 7)], 1.0);
        assert_eq!(x[(0, 8)], 0.0);
    }

    #[test]
    fn unseen_category_encodes_as_zeros() {
        let pre = Preprocessor::fit(&training_rows()).unwrap();
        let x = pre.transform(&[row(Some(7.0), Some("Moderate"))]);
        assert_eq!(x.shape(), &[1, pre.n_features()]);
        for k in 6..9 {
            assert_eq!(x[(0, k)], 0.0);
        }
        // the other categorical blocks are still set
        assert_eq!(x.row(0).iter().filter(|&&v| v == 1.0).count(), 2);
    }

    #[test]
    fn feature_names_follow_column_layout() {
        let pre = Preprocessor::fit(&training_rows()).unwrap();
        let names = pre.feature_names();
        assert_eq!(names.len(), pre.n_features());
        assert_eq!(names[0], "sleep_duration");
        assert_eq!(names[6], "caffeine_intake_High");
        assert_eq!(names.last().map(String::as_str), Some("sleep_interruptions_No"));
    }

    #[test]
    fn column_without_values_cannot_be_fit() {
        let rows = vec![row(None, Some("Low")), row(None, Some("High"))];
        assert!(matches!(
            Preprocessor::fit(&rows),
            Err(Error::EmptyColumn { column }) if column == "sleep_duration"
        ));
    }
}
