// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction:
//
//   heart-forest [OPTIONS] <source_path> <max_depth> <max_features>
//
// clap collects the positional tokens as plain strings and the
// domain parser turns them into RunParameters, so a missing or
// malformed parameter is reported as MissingArgument /
// InvalidNumericFormat rather than a clap usage error. Negative
// numbers are let through as positional values for the same
// reason: range checks belong to the classifier.
//
// All business logic is delegated to Layer 2 (application).
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::RunOptions;

use crate::application::train_use_case::{RunSummary, TrainUseCase};
use crate::domain::parameters::parse_parameters;
use crate::infra::tracking::FileTracker;

/// Program name handed to the parameter parser as token 0
const PROGRAM: &str = "heart-forest";

/// Train a random forest on heart-disease records and log
/// cross-validated Precision, Recall, F1 and MCC to a tracking run.
#[derive(Parser, Debug)]
#[command(
    name = "heart-forest",
    version = "0.1.0",
    about = "Cross-validate a random forest on heart-disease data and track the metrics.",
    allow_negative_numbers = true
)]
pub struct Cli {
    /// <source_path> <max_depth> <max_features>
    #[arg(value_name = "PARAMS", num_args = 0..)]
    pub params: Vec<String>,

    #[command(flatten)]
    pub options: RunOptions,
}

impl Cli {
    /// Parse the positional parameters, run training, print the summary.
    pub fn run(self) -> Result<()> {
        let argv: Vec<&str> = std::iter::once(PROGRAM)
            .chain(self.params.iter().map(String::as_str))
            .collect();
        let params = parse_parameters(&argv).context("Invalid run parameters")?;

        let config = self.options.into_config(params);
        tracing::info!(
            "Training on '{}' (max_depth={}, max_features={})",
            config.source_path,
            config.max_depth,
            config.max_features
        );

        let mut tracker = FileTracker::new(&config.tracking_dir, &config.experiment)?;
        let use_case = TrainUseCase::new(config);
        let summary = use_case.execute(&mut tracker)?;

        print_summary(&summary, &tracker);
        Ok(())
    }
}

fn print_summary(summary: &RunSummary, tracker: &FileTracker) {
    println!(
        "\nRun {} ({} records, {} features)",
        summary.run, summary.n_samples, summary.n_features
    );
    for (name, value) in summary.report.entries() {
        println!("  {:<22}{:.4}", name, value);
    }
    println!("  {:<22}{:.4}", "(accuracy)", summary.accuracy);
    println!("Recorded in {}", tracker.run_dir(&summary.run).display());
}
