// ============================================================
// Layer 4 - Feature Pipeline
// ============================================================
// Turns raw string cells into the numeric matrix the forest
// trains on. Two column groups are handled:
//
//   numeric      missing -> column median, then (x - mean) / std
//   categorical  one output column per observed distinct value
//
// Output layout: every numeric column in declared order, then
// each categorical column's one-hot block in declared order.
//
// Missing numeric cells are empty, "NA", "NaN" or "?".
// Infinite values ("inf", "-inf") are a data error.
// Standard deviation is the population one (divide by n).
// A constant column keeps a scale of 1.0 so it maps to zeros.
//
// Reference: Rust Book §13 (Iterators)
//            ndarray crate documentation

use std::cmp::Ordering;

use ndarray::Array2;

use crate::domain::dataset::{Dataset, CATEGORICAL_ATTRS, NUMERIC_ATTRS};
use crate::domain::error::{Result, RunError};
use crate::domain::traits::FeatureTransform;

/// Learned statistics for one numeric column
#[derive(Debug, Clone, PartialEq)]
struct NumericStats {
    name: String,
    median: f64,
    mean: f64,
    scale: f64,
}

/// Learned categories for one categorical column
#[derive(Debug, Clone, PartialEq)]
struct CategoryStats {
    name: String,
    categories: Vec<String>,
}

/// Median imputer + standard scaler for numeric columns and a
/// one-hot encoder for categorical columns.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    categorical: Vec<String>,
    numeric: Vec<String>,
    numeric_stats: Vec<NumericStats>,
    category_stats: Vec<CategoryStats>,
}

impl FeaturePipeline {
    /// Pipeline over explicit column sets
    pub fn new(categorical: &[&str], numeric: &[&str]) -> Self {
        Self {
            categorical: categorical.iter().map(|s| s.to_string()).collect(),
            numeric: numeric.iter().map(|s| s.to_string()).collect(),
            numeric_stats: Vec::new(),
            category_stats: Vec::new(),
        }
    }

    /// Pipeline over the fixed heart-disease schema
    pub fn heart() -> Self {
        Self::new(&CATEGORICAL_ATTRS, &NUMERIC_ATTRS)
    }

    /// True once `fit_transform` has run
    pub fn is_fitted(&self) -> bool {
        self.numeric_stats.len() == self.numeric.len()
            && self.category_stats.len() == self.categorical.len()
            && !(self.numeric.is_empty() && self.categorical.is_empty())
    }

    /// Width of the output matrix after fitting
    pub fn n_output_features(&self) -> usize {
        self.numeric_stats.len()
            + self
                .category_stats
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// Output column names, e.g. `age`, `cp=2`
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.numeric_stats.iter().map(|s| s.name.clone()).collect();
        for col in &self.category_stats {
            for cat in &col.categories {
                names.push(format!("{}={}", col.name, cat));
            }
        }
        names
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        let mut numeric_stats = Vec::with_capacity(self.numeric.len());
        for name in &self.numeric {
            let idx = require_column(data, name)?;
            let values = parse_numeric_column(data, idx, name)?;
            numeric_stats.push(fit_numeric(name, &values));
        }

        let mut category_stats = Vec::with_capacity(self.categorical.len());
        for name in &self.categorical {
            let idx = require_column(data, name)?;
            let mut categories: Vec<String> = data.column(idx).map(str::to_string).collect();
            categories.sort_by(|a, b| compare_categories(a, b));
            categories.dedup();
            category_stats.push(CategoryStats {
                name: name.clone(),
                categories,
            });
        }

        self.numeric_stats = numeric_stats;
        self.category_stats = category_stats;

        tracing::debug!(
            "Feature pipeline fitted: {} numeric + {} one-hot columns",
            self.numeric_stats.len(),
            self.n_output_features() - self.numeric_stats.len()
        );
        Ok(())
    }
}

impl FeatureTransform for FeaturePipeline {
    fn fit_transform(&mut self, data: &Dataset) -> Result<Array2<f64>> {
        self.fit(data)?;
        self.transform(data)
    }

    fn transform(&self, data: &Dataset) -> Result<Array2<f64>> {
        if !self.is_fitted() {
            return Err(RunError::data_load(
                &data.source,
                "feature pipeline used before it was fitted",
            ));
        }

        let mut out = Array2::<f64>::zeros((data.len(), self.n_output_features()));
        let mut offset = 0;

        // ── Numeric block: impute, then standardise ───────────────────────────
        for stats in &self.numeric_stats {
            let idx = require_column(data, &stats.name)?;
            let values = parse_numeric_column(data, idx, &stats.name)?;
            for (row, value) in values.into_iter().enumerate() {
                let x = value.unwrap_or(stats.median);
                out[[row, offset]] = (x - stats.mean) / stats.scale;
            }
            offset += 1;
        }

        // ── Categorical block: one-hot ────────────────────────────────────────
        // Values not seen during fit leave their block all zeros.
        for stats in &self.category_stats {
            let idx = require_column(data, &stats.name)?;
            for (row, cell) in data.column(idx).enumerate() {
                if let Some(pos) = stats.categories.iter().position(|c| c == cell) {
                    out[[row, offset + pos]] = 1.0;
                }
            }
            offset += stats.categories.len();
        }

        Ok(out)
    }
}

fn require_column(data: &Dataset, name: &str) -> Result<usize> {
    data.column_index(name)
        .ok_or_else(|| RunError::data_load(&data.source, format!("missing column '{name}'")))
}

fn is_missing(cell: &str) -> bool {
    matches!(cell, "" | "?" | "NA" | "N/A" | "NaN" | "nan" | "null")
}

fn parse_numeric_column(data: &Dataset, idx: usize, name: &str) -> Result<Vec<Option<f64>>> {
    data.column(idx)
        .enumerate()
        .map(|(row, cell)| {
            if is_missing(cell) {
                return Ok(None);
            }
            match cell.parse::<f64>() {
                Ok(v) if v.is_nan() => Ok(None),
                Ok(v) if v.is_infinite() => Err(RunError::data_load(
                    &data.source,
                    format!("record {}: column '{name}' value {cell:?} is not finite", row + 1),
                )),
                Ok(v) => Ok(Some(v)),
                Err(_) => Err(RunError::data_load(
                    &data.source,
                    format!("record {}: column '{name}' value {cell:?} is not numeric", row + 1),
                )),
            }
        })
        .collect()
}

fn fit_numeric(name: &str, values: &[Option<f64>]) -> NumericStats {
    let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
    observed.sort_by(|a, b| a.total_cmp(b));

    let median = match observed.len() {
        0 => {
            tracing::warn!("Column '{}' has no values; imputing 0.0", name);
            0.0
        }
        n if n % 2 == 1 => observed[n / 2],
        n => (observed[n / 2 - 1] + observed[n / 2]) / 2.0,
    };

    let imputed: Vec<f64> = values.iter().map(|v| v.unwrap_or(median)).collect();
    let n = imputed.len().max(1) as f64;
    let mean = imputed.iter().sum::<f64>() / n;
    let var = imputed.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    let scale = if std > f64::EPSILON { std } else { 1.0 };

    NumericStats {
        name: name.to_string(),
        median,
        mean,
        scale,
    }
}

// Numeric order when both sides are numbers, text order otherwise
fn compare_categories(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> Dataset {
        Dataset::new(
            "toy.csv",
            vec!["chol".into(), "cp".into()],
            vec![
                vec!["1".into(), "2".into()],
                vec!["".into(), "10".into()],
                vec!["3".into(), "2".into()],
                vec!["5".into(), "0".into()],
            ],
            vec![0, 1, 0, 1],
        )
    }

    #[test]
    fn test_median_imputation_and_scaling() {
        let mut p = FeaturePipeline::new(&["cp"], &["chol"]);
        let x = p.fit_transform(&toy()).unwrap();

        // observed [1,3,5] → median 3; imputed [1,3,3,5] → mean 3, std 1.414..
        let std = 2.0_f64.sqrt();
        assert!((x[[0, 0]] - (-2.0 / std)).abs() < 1e-12);
        assert!(x[[1, 0]].abs() < 1e-12);
        assert!((x[[3, 0]] - 2.0 / std).abs() < 1e-12);

        let column_mean: f64 = x.column(0).sum() / 4.0;
        assert!(column_mean.abs() < 1e-12);
    }

    #[test]
    fn test_one_hot_sorted_numerically() {
        let mut p = FeaturePipeline::new(&["cp"], &["chol"]);
        let x = p.fit_transform(&toy()).unwrap();

        assert_eq!(p.n_output_features(), 4);
        assert_eq!(p.feature_names(), vec!["chol", "cp=0", "cp=2", "cp=10"]);
        // row 1 has cp=10, the last category
        assert_eq!(x.row(1).to_vec()[1..], [0.0, 0.0, 1.0]);
        // every row has exactly one hot bit in the block
        for row in x.rows() {
            let hot: f64 = row.iter().skip(1).sum();
            assert_eq!(hot, 1.0);
        }
    }

    #[test]
    fn test_constant_column_maps_to_zero() {
        let ds = Dataset::new(
            "c.csv",
            vec!["age".into()],
            vec![vec!["50".into()], vec!["50".into()]],
            vec![0, 1],
        );
        let mut p = FeaturePipeline::new(&[], &["age"]);
        let x = p.fit_transform(&ds).unwrap();
        assert_eq!(x.column(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_non_numeric_cell_is_data_error() {
        let ds = Dataset::new(
            "bad.csv",
            vec!["age".into()],
            vec![vec!["old".into()]],
            vec![1],
        );
        let mut p = FeaturePipeline::new(&[], &["age"]);
        assert!(matches!(
            p.fit_transform(&ds).unwrap_err(),
            RunError::DataLoadFailure { .. }
        ));
    }

    #[test]
    fn test_infinite_cell_is_data_error() {
        for cell in ["inf", "-inf", "infinity"] {
            let ds = Dataset::new(
                "inf.csv",
                vec!["age".into()],
                vec![vec![cell.into()], vec!["40".into()], vec!["50".into()]],
                vec![0, 1, 0],
            );
            let mut p = FeaturePipeline::new(&[], &["age"]);
            let err = p.fit_transform(&ds).unwrap_err();
            assert!(matches!(err, RunError::DataLoadFailure { .. }), "{cell}: {err}");
        }
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let p = FeaturePipeline::new(&["cp"], &["chol"]);
        assert!(p.transform(&toy()).is_err());
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let mut p = FeaturePipeline::new(&["cp"], &[]);
        p.fit_transform(&toy()).unwrap();
        let other = Dataset::new("o.csv", vec!["cp".into()], vec![vec!["7".into()]], vec![0]);
        let x = p.transform(&other).unwrap();
        assert_eq!(x.row(0).sum(), 0.0);
    }

    #[test]
    fn test_deterministic() {
        let mut a = FeaturePipeline::heart();
        let mut b = FeaturePipeline::heart();
        let ds = crate::data::fixtures::heart_dataset(40, 3);
        assert_eq!(a.fit_transform(&ds).unwrap(), b.fit_transform(&ds).unwrap());
    }
}
