// ============================================================
// Layer 3 - Run Error Taxonomy
// ============================================================
// Every way a training run can fail. All variants are fatal:
// the run stops, the tracking run is marked FAILED and the
// process exits with a nonzero status. Nothing is retried.
//
//   MissingArgument        fewer than three positional parameters
//   InvalidNumericFormat   max_depth / max_features not an integer
//   DataLoadFailure        file missing, unreadable, or wrong schema
//   InsufficientFoldData   a fold would see no rows of some class
//   InvalidFoldCount       fewer than two folds requested
//   InvalidHyperparameter  the classifier refused its settings
//   LengthMismatch         row or label counts disagree
//   WorkerPool             the fold thread pool could not start
//   SinkFailure            the tracking store rejected a write
//
// Reference: Rust Book §9 (Recoverable Errors with Result)
//            thiserror crate documentation

use std::num::ParseIntError;

/// Errors produced by the domain, data and ml layers.
/// The application layer wraps these in `anyhow` with context.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("missing positional argument #{position} <{name}>")]
    MissingArgument { position: usize, name: &'static str },

    #[error("invalid integer for <{name}>: {value:?}")]
    InvalidNumericFormat {
        name: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("failed to load data from '{path}': {reason}")]
    DataLoadFailure { path: String, reason: String },

    #[error("insufficient fold data: {reason}")]
    InsufficientFoldData { reason: String },

    #[error("at least 2 folds are required, got {0}")]
    InvalidFoldCount(usize),

    #[error("invalid hyperparameter {name}={value}: {reason}")]
    InvalidHyperparameter {
        name: &'static str,
        value: i64,
        reason: String,
    },

    #[error("length mismatch: expected {expected} entries, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("cannot start fold worker pool: {0}")]
    WorkerPool(String),

    #[error("metric sink failure: {0}")]
    SinkFailure(String),
}

impl RunError {
    /// Shorthand for a data-load failure on the given path
    pub fn data_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        RunError::DataLoadFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a fold-allocation failure
    pub fn insufficient_folds(reason: impl Into<String>) -> Self {
        RunError::InsufficientFoldData {
            reason: reason.into(),
        }
    }
}

/// Tracking stores surface I/O and JSON problems as sink failures
impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        RunError::SinkFailure(e.to_string())
    }
}

impl From<serde_json::Error> for RunError {
    fn from(e: serde_json::Error) -> Self {
        RunError::SinkFailure(e.to_string())
    }
}

/// Result alias used throughout the lower layers
pub type Result<T> = std::result::Result<T, RunError>;
