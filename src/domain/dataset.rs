// ============================================================
// Layer 3 - Dataset Domain Type
// ============================================================
// An ordered set of raw tabular records. Feature cells are kept
// as the original strings; turning them into numbers is the job
// of the feature pipeline (Layer 4), not of this type.
//
// The label column (`target`) is split out on load so that the
// features can never accidentally include it.
//
// Reference: Rust Book §5 (Structs), §8 (Vectors)

use serde::{Deserialize, Serialize};

/// Name of the label column
pub const TARGET_COLUMN: &str = "target";

/// Columns that are one-hot encoded
pub const CATEGORICAL_ATTRS: [&str; 6] = ["sex", "cp", "fbs", "restecg", "exang", "slope"];

/// Columns that are median-imputed and standardised
pub const NUMERIC_ATTRS: [&str; 7] = ["age", "trestbps", "chol", "thalach", "oldpeak", "ca", "thal"];

/// Raw records loaded once and read-only afterwards.
///
/// Invariant: every row in `cells` has `columns.len()` entries
/// and `target.len() == cells.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Where the records came from, for log messages
    pub source: String,

    /// Feature column names in header order (label excluded)
    pub columns: Vec<String>,

    /// Raw feature cells, one inner Vec per record
    pub cells: Vec<Vec<String>>,

    /// Integer class label per record
    pub target: Vec<i64>,
}

impl Dataset {
    pub fn new(
        source: impl Into<String>,
        columns: Vec<String>,
        cells: Vec<Vec<String>>,
        target: Vec<i64>,
    ) -> Self {
        debug_assert_eq!(cells.len(), target.len());
        Self {
            source: source.into(),
            columns,
            cells,
            target,
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Position of a feature column, if present
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over one feature column's raw cells in record order
    pub fn column<'a>(&'a self, index: usize) -> impl Iterator<Item = &'a str> + 'a {
        self.cells.iter().map(move |row| row[index].as_str())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Dataset {
        Dataset::new(
            "tiny.csv",
            vec!["age".into(), "sex".into()],
            vec![vec!["63".into(), "1".into()], vec!["41".into(), "0".into()]],
            vec![1, 0],
        )
    }

    #[test]
    fn test_len_and_columns() {
        let ds = tiny();
        assert_eq!(ds.len(), 2);
        assert!(!ds.is_empty());
        assert_eq!(ds.column_index("sex"), Some(1));
        assert_eq!(ds.column_index("target"), None);
    }

    #[test]
    fn test_column_iteration_keeps_order() {
        let ds = tiny();
        let ages: Vec<&str> = ds.column(0).collect();
        assert_eq!(ages, vec!["63", "41"]);
    }
}
