// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers to carry out one tracked
// training run.
//
// Rules for this layer:
//   - No numeric or model code here
//   - No printing here (that's Layer 1)
//   - No direct file access (that's Layer 4 and 6)
//   - Only workflow coordination and error context
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The load -> featurise -> cross-validate -> report workflow
pub mod train_use_case;
