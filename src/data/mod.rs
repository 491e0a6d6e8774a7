// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from .npy files on disk
// all the way to tensor batches.
//
// The pipeline flows in this order:
//
//   features.npy / mfccs.npy / labels.npy
//       │
//       ▼
//   NpyDatasetLoader  → parses the arrays, checks N matches
//       │
//       ▼
//   LabelEncoder      → class names → indices → one-hot rows
//       │
//       ▼
//   Splitter          → seeded train/test index partition
//       │
//       ▼
//   MfccDataset       → implements Burn's Dataset trait
//       │
//       ▼
//   MfccBatcher       → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// NumPy .npy array parser
pub mod npy;

/// Loads features, MFCCs and labels from .npy files
pub mod loader;

/// Sorted-vocabulary label encoding and one-hot conversion
pub mod label_encoder;

/// Seeded train/test splitting
pub mod splitter;

/// Implements Burn's Dataset trait for MFCC samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
