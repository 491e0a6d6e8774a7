// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The network, its training loop and evaluation.
//
//   model.rs     — The convolutional classifier
//                  • 4 × [Conv2d → ReLU → MaxPool 2 → Dropout]
//                    with 16 / 32 / 32 / 64 filters
//                  • Global average pooling
//                  • Dense head, softmax over the classes
//
//   trainer.rs   — The training loop
//                  Baseline, forward / backward / Adam step,
//                  per-epoch validation, best checkpoint and
//                  final model persistence
//
//   evaluator.rs — Loss and accuracy over a data loader,
//                  and scoring of a saved model
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Convolutional MFCC classifier
pub mod model;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Evaluation passes over data loaders
pub mod evaluator;
