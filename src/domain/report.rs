// ============================================================
// Layer 3 - Prediction and Metric Report Types
// ============================================================
// PredictionResult  one out-of-fold prediction per record,
//                   aligned with the input row order, plus
//                   one FoldRecord per cross-validation fold
// MetricReport      the four scalar metrics of one run
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

pub const PRECISION: &str = "Precision";
pub const RECALL: &str = "Recall";
pub const F1_SCORE: &str = "F1 score";
pub const MATTHEWS_CORRELATION: &str = "Matthews Correlation";

/// Metric names in the order they are reported
pub const METRIC_NAMES: [&str; 4] = [PRECISION, RECALL, F1_SCORE, MATTHEWS_CORRELATION];

/// True and predicted labels for every record.
///
/// Invariant: both Vecs have the dataset's length and index `i`
/// refers to record `i` of the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub true_labels: Vec<i64>,
    pub predicted_labels: Vec<i64>,
    /// Stage results of each fold, in fold order
    pub folds: Vec<FoldRecord>,
}

/// What one fold saw: rows its classifier was fitted on and rows
/// it then predicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldRecord {
    pub fold: usize,
    pub train_rows: usize,
    pub held_out_rows: usize,
}

impl PredictionResult {
    pub fn len(&self) -> usize {
        self.true_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.true_labels.is_empty()
    }

    /// Fraction of records whose prediction equals the label
    pub fn accuracy(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let hits = self
            .true_labels
            .iter()
            .zip(&self.predicted_labels)
            .filter(|(t, p)| t == p)
            .count();
        hits as f64 / self.len() as f64
    }
}

/// Binary confusion counts against one positive label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_pos: u64,
    pub false_pos: u64,
    pub true_neg: u64,
    pub false_neg: u64,
}

/// The four metrics of one run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    /// Label value treated as the positive class
    pub positive_label: i64,
    pub counts: ConfusionCounts,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub mcc: f64,
}

impl MetricReport {
    /// (name, value) pairs in reporting order
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            (PRECISION, self.precision),
            (RECALL, self.recall),
            (F1_SCORE, self.f1),
            (MATTHEWS_CORRELATION, self.mcc),
        ]
    }

    /// Look up a metric by its reported name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}
