// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles persistence concerns that don't belong in any
// specific business layer:
//
//   checkpoint.rs — Best-epoch checkpoint and final model
//                   Uses Burn's CompactRecorder for weights and
//                   optimizer state, JSON for configs and the
//                   label vocabulary.
//
//   metrics.rs    — Training metrics logging
//                   Writes epoch-level loss / accuracy to CSV.
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
