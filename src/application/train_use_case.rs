// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates one tracked training run in order:
//
//   Step 0: Open the tracking run         (Layer 6 - infra)
//   Step 1: Load the CSV records          (Layer 4 - data)
//   Step 2: Fit the feature pipeline      (Layer 4 - data)
//   Step 3: Assign cross-validation folds (Layer 4 - data)
//   Step 4: Out-of-fold prediction        (Layer 5 - ml)
//           and per-fold stage params
//   Step 5: Compute and log the metrics   (Layer 5 - ml)
//   Step 6: Mark the run FINISHED         (Layer 6 - infra)
//
// Any error between Step 0 and Step 6 drops the RunGuard, which
// marks the run FAILED before the error reaches the CLI.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    loader::CsvLoader,
    preprocessor::FeaturePipeline,
    splitter::{FoldPlan, FoldStrategy},
};
use crate::domain::parameters::RunParameters;
use crate::domain::report::MetricReport;
use crate::domain::traits::{FeatureTransform, MetricSink, RunHandle};
use crate::infra::tracking::RunGuard;
use crate::ml::{
    cross_val::predict_oof,
    forest::{ForestParams, RandomForest},
    metrics::compute_and_report,
};

/// File name of the resolved config stored with each run
pub const CONFIG_ARTIFACT: &str = "train_config.json";

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything one run needs. The three positional parameters
// plus the optional flags, resolved to concrete values.
// Saved as JSON next to the run's metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub source_path:    String,
    pub max_depth:      i64,
    pub max_features:   i64,
    pub n_estimators:   usize,
    pub random_state:   u64,
    pub folds:          usize,
    pub fold_strategy:  FoldStrategy,
    pub positive_label: i64,
    pub workers:        usize,
    pub tracking_dir:   String,
    pub experiment:     String,
    pub run_name:       Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            source_path:    "data/heart.csv".to_string(),
            max_depth:      5,
            max_features:   3,
            n_estimators:   100,
            random_state:   42,
            folds:          3,
            fold_strategy:  FoldStrategy::Stratified,
            positive_label: 1,
            workers:        1,
            tracking_dir:   "mlruns".to_string(),
            experiment:     "Default".to_string(),
            run_name:       None,
        }
    }
}

impl TrainConfig {
    /// Defaults everywhere except the three positional parameters
    pub fn from_parameters(params: RunParameters) -> Self {
        Self {
            source_path:  params.source_path,
            max_depth:    params.max_depth,
            max_features: params.max_features,
            ..Self::default()
        }
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators: self.n_estimators,
            max_depth:    self.max_depth,
            max_features: self.max_features,
            random_state: self.random_state,
        }
    }
}

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run:        RunHandle,
    pub n_samples:  usize,
    pub n_features: usize,
    /// Share of out-of-fold predictions equal to the true label
    pub accuracy:   f64,
    pub report:     MetricReport,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full workflow against any sink.
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full run end to end, recording into `sink`
    pub fn execute<S: MetricSink + ?Sized>(&self, sink: &mut S) -> Result<RunSummary> {
        let cfg = &self.config;

        // ── Step 0: Open the tracking run ─────────────────────────────────────
        // The guard ends the run FAILED if anything below returns early
        let mut guard = RunGuard::start(sink, cfg.run_name.as_deref())
            .context("Failed to start tracking run")?;
        tracing::info!("Run {} started for '{}'", guard.handle(), cfg.source_path);

        guard.log_param("source_path", &cfg.source_path)?;
        guard.log_param("max_depth", cfg.max_depth)?;
        guard.log_param("max_features", cfg.max_features)?;
        guard.log_param("n_estimators", cfg.n_estimators)?;
        guard.log_param("random_state", cfg.random_state)?;
        guard.log_param("folds", cfg.folds)?;
        guard.log_param("fold_strategy", cfg.fold_strategy)?;
        guard.log_param("positive_label", cfg.positive_label)?;

        let config_json = serde_json::to_string_pretty(cfg)?;
        guard
            .log_artifact(CONFIG_ARTIFACT, &config_json)
            .context("Failed to store run config")?;

        // ── Step 1: Load the CSV records ──────────────────────────────────────
        let dataset = CsvLoader::new(&cfg.source_path)
            .load()
            .with_context(|| format!("Failed to load '{}'", cfg.source_path))?;
        tracing::info!("Loaded {} records", dataset.len());

        // ── Step 2: Fit the feature pipeline ──────────────────────────────────
        // Fit once on the full data, then cross-validate on the matrix
        let mut pipeline = FeaturePipeline::heart();
        let features = pipeline
            .fit_transform(&dataset)
            .context("Failed to build feature matrix")?;
        let (n_samples, n_features) = features.dim();
        tracing::info!("Feature matrix: {} rows x {} columns", n_samples, n_features);

        guard.log_param("n_samples", n_samples)?;
        guard.log_param("n_features", n_features)?;

        // ── Step 3: Assign cross-validation folds ─────────────────────────────
        let plan = FoldPlan::new(cfg.fold_strategy, &dataset.target, cfg.folds)
            .context("Failed to assign cross-validation folds")?;
        tracing::info!(
            "{} {} folds with sizes {:?}",
            plan.n_folds(),
            cfg.fold_strategy,
            plan.fold_sizes()
        );

        // ── Step 4: Out-of-fold prediction ────────────────────────────────────
        // Every fold gets a fresh forest from the same seed
        let forest_params = cfg.forest_params();
        let predictions = predict_oof(
            features.view(),
            &dataset.target,
            || RandomForest::new(forest_params),
            &plan,
            cfg.workers,
        )
        .context("Cross-validated prediction failed")?;

        // Post-fit and post-predict row counts of every fold
        for record in &predictions.folds {
            guard.log_param(&format!("fold_{}_train_rows", record.fold), record.train_rows)?;
            guard.log_param(
                &format!("fold_{}_held_out_rows", record.fold),
                record.held_out_rows,
            )?;
        }

        let accuracy = predictions.accuracy();
        tracing::info!("Out-of-fold accuracy: {:.4}", accuracy);

        // ── Step 5: Compute and log the metrics ───────────────────────────────
        let report = {
            let (sink, run) = guard.parts();
            compute_and_report(
                &predictions.true_labels,
                &predictions.predicted_labels,
                cfg.positive_label,
                sink,
                run,
            )
            .context("Failed to report metrics")?
        };

        // ── Step 6: Mark the run FINISHED ─────────────────────────────────────
        let run = guard.finish().context("Failed to close tracking run")?;
        tracing::info!("Run {} finished", run);

        Ok(RunSummary {
            run,
            n_samples,
            n_features,
            accuracy,
            report,
        })
    }
}
