// ============================================================
// Layer 3 — Data Errors
// ============================================================
// Typed failures for everything that can go wrong between the
// .npy files on disk and the tensors handed to the model.
//
// The application layer wraps these in anyhow with context,
// so the messages here only describe the fault itself.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed .npy data in {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Unsupported dtype '{descr}' in {path}")]
    UnsupportedDtype { path: PathBuf, descr: String },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Label '{0}' is not in the fitted vocabulary")]
    UnknownLabel(String),

    #[error("Dataset is empty")]
    Empty,
}
