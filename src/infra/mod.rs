// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the application layer but
// owned by none of the business layers:
//
//   tracking.rs  Experiment tracking store
//                One directory per run holding run metadata,
//                logged params, a metrics CSV and artifacts.
//                RunGuard closes the run on every exit path.
//
// The application only sees the MetricSink trait from Layer 3,
// so the file store can be swapped for another backend (or the
// in-memory one used by tests) without touching the workflow.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// File-backed, run-scoped metric sink
pub mod tracking;
