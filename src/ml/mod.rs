// ============================================================
// Layer 5 - ML Layer
// ============================================================
// Everything that learns from or scores the feature matrix.
// Nothing here reads files or parses arguments.
//
//   tree.rs       CART decision tree (Gini, depth limit,
//                 per-split feature sampling)
//
//   forest.rs     Random forest over bootstrap samples;
//                 implements the Classifier trait
//
//   cross_val.rs  Out-of-fold predictor: one fresh classifier
//                 per fold, optional rayon fold parallelism
//
//   metrics.rs    Precision, Recall, F1 and Matthews
//                 correlation, written to the tracking run
//
// Reference: Breiman et al. (1984) Classification and Regression Trees
//            Breiman (2001) Random Forests

/// Single CART tree used by the forest
pub mod tree;

/// Bootstrap-aggregated tree ensemble
pub mod forest;

/// Stratified / k-fold out-of-fold prediction
pub mod cross_val;

/// Binary classification metrics and reporting
pub mod metrics;
