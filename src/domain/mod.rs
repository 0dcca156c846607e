// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types and traits describing one training run.
// Nothing here touches the filesystem or does numeric work.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Typed error taxonomy shared by every layer below the CLI
pub mod error;

// The three positional parameters and their parser
pub mod parameters;

// Raw tabular records and the fixed column schema
pub mod dataset;

// Out-of-fold predictions and the four-metric report
pub mod report;

// Collaborator seams: feature transform, classifier, metric sink
pub mod traits;
