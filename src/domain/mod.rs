// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the data the
// pipeline moves around: feature arrays, MFCC grids, labels.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// Typed data-pipeline failures
pub mod error;

// Feature matrices and the MFCC grid layout
pub mod features;

// Label strings and their one-hot encoding
pub mod labels;

// Core abstractions (traits) that other layers implement
pub mod traits;
