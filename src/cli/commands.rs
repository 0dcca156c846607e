// ============================================================
// Layer 1 - CLI Options
// ============================================================
// Optional flags layered on top of the three positional
// parameters. Every flag has a default, so
//
//   heart-forest heart.csv 5 3
//
// runs exactly like the plain positional invocation.
//
// clap's derive macros generate:
//   - help text (--help)
//   - type conversion (string -> usize, i64, enum)
//   - errors for malformed flag values
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::data::splitter::FoldStrategy;
use crate::domain::parameters::RunParameters;

/// Fold assignment policy as spelled on the command line
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FoldStrategyArg {
    /// Keep each class's share roughly equal in every fold
    #[default]
    Stratified,
    /// Contiguous blocks in file order
    Kfold,
}

impl From<FoldStrategyArg> for FoldStrategy {
    fn from(arg: FoldStrategyArg) -> Self {
        match arg {
            FoldStrategyArg::Stratified => FoldStrategy::Stratified,
            FoldStrategyArg::Kfold => FoldStrategy::KFold,
        }
    }
}

/// Run settings beyond the positional parameters.
#[derive(Args, Debug, Clone)]
pub struct RunOptions {
    /// Number of cross-validation folds
    #[arg(long, default_value_t = 3)]
    pub folds: usize,

    /// How records are assigned to folds
    #[arg(long, value_enum, default_value_t = FoldStrategyArg::Stratified)]
    pub fold_strategy: FoldStrategyArg,

    /// Label treated as the positive class by the metrics
    #[arg(long, default_value_t = 1)]
    pub positive_label: i64,

    /// Number of trees in the forest
    #[arg(long, default_value_t = 100)]
    pub n_estimators: usize,

    /// Seed for bootstrap sampling and feature selection
    #[arg(long, default_value_t = 42)]
    pub random_state: u64,

    /// Threads used to run folds in parallel (1 = sequential)
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Root directory of the experiment tracking store
    #[arg(long, default_value = "mlruns")]
    pub tracking_dir: String,

    /// Experiment the run is recorded under
    #[arg(long, default_value = "Default")]
    pub experiment: String,

    /// Optional human-readable run name
    #[arg(long)]
    pub run_name: Option<String>,
}

impl RunOptions {
    /// Combine with the parsed positional parameters into a TrainConfig.
    /// The application layer never sees clap types.
    pub fn into_config(self, params: RunParameters) -> TrainConfig {
        TrainConfig {
            source_path:    params.source_path,
            max_depth:      params.max_depth,
            max_features:   params.max_features,
            n_estimators:   self.n_estimators,
            random_state:   self.random_state,
            folds:          self.folds,
            fold_strategy:  self.fold_strategy.into(),
            positive_label: self.positive_label,
            workers:        self.workers,
            tracking_dir:   self.tracking_dir,
            experiment:     self.experiment,
            run_name:       self.run_name,
        }
    }
}
