// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training or re-evaluating a model).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination

// The training workflow
pub mod train_use_case;

// Re-scoring a saved model
pub mod evaluate_use_case;
