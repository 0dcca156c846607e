// ============================================================
// Layer 3 - Core Traits (Collaborator Seams)
// ============================================================
// The run talks to its three collaborators only through these
// traits:
//
//   FeatureTransform  raw records -> numeric feature matrix
//   Classifier        fit / predict on a feature matrix
//   MetricSink        run-scoped key/value metric store
//
// Concrete implementations live in Layer 4 (FeaturePipeline),
// Layer 5 (RandomForest) and Layer 6 (FileTracker). Tests plug
// in their own small implementations.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::domain::dataset::Dataset;
use crate::domain::error::Result;

// ─── FeatureTransform ─────────────────────────────────────────────────────────
/// Maps raw records to one numeric row per record.
/// Must be deterministic for the same input rows.
pub trait FeatureTransform {
    /// Learn any statistics from `data` and return its transformed matrix
    fn fit_transform(&mut self, data: &Dataset) -> Result<Array2<f64>>;

    /// Transform with previously learned statistics
    fn transform(&self, data: &Dataset) -> Result<Array2<f64>>;
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// A supervised classifier. Each cross-validation fold gets a
/// fresh instance, so implementations need not support refitting.
pub trait Classifier {
    /// Train on `features` (one row per sample) and `labels`
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: &[i64]) -> Result<()>;

    /// Predict one label per row of `features`
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<i64>>;
}

// ─── MetricSink ───────────────────────────────────────────────────────────────
/// Opaque identifier of one tracking run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunHandle(pub String);

impl RunHandle {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// A store of runs, each holding params and metrics.
/// Values logged to one run never appear in another.
pub trait MetricSink {
    /// Open a new run and return its handle
    fn start_run(&mut self, run_name: Option<&str>) -> Result<RunHandle>;

    /// Record a string-valued parameter (last write wins)
    fn log_param(&mut self, run: &RunHandle, key: &str, value: &str) -> Result<()>;

    /// Record one metric value at the given step
    fn log_metric(&mut self, run: &RunHandle, name: &str, value: f64, step: u64) -> Result<()>;

    /// Store a named text artifact (e.g. the resolved config) with the run
    fn log_artifact(&mut self, run: &RunHandle, name: &str, contents: &str) -> Result<()>;

    /// Close the run with a terminal status; later writes fail
    fn end_run(&mut self, run: &RunHandle, status: RunStatus) -> Result<()>;
}
