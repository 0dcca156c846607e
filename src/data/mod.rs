// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between the CSV file on disk and the numeric
// feature matrix the classifier sees:
//
//   heart.csv
//       │
//       ▼
//   CsvLoader        → reads and validates records
//       │
//       ▼
//   FeaturePipeline  → impute + scale numeric, one-hot categorical
//       │
//       ▼
//   FoldPlan         → assigns every record to a test fold
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Reads the heart-disease CSV into a Dataset
pub mod loader;

/// Median imputer, standard scaler and one-hot encoder
pub mod preprocessor;

/// Stratified and contiguous k-fold assignment
pub mod splitter;

#[cfg(test)]
pub mod fixtures;
