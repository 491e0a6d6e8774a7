// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer loads training data through this
// trait so it never sees how the arrays are stored.
//
// Implementations:
//   - NpyDatasetLoader → three .npy files on disk

use crate::domain::{
    error::DataError,
    features::FeatureMatrix,
    labels::LabelSet,
};

/// Everything read from disk before any encoding or splitting.
#[derive(Debug, Clone)]
pub struct RawDataset {
    /// Raw feature table, loaded for diagnostics only.
    pub features: FeatureMatrix,
    /// Flattened MFCCs, one row per example.
    pub mfccs:    FeatureMatrix,
    pub labels:   LabelSet,
}

impl RawDataset {
    /// Check that all three arrays describe the same N examples.
    pub fn validate(&self) -> Result<usize, DataError> {
        if self.labels.is_empty() {
            return Err(DataError::Empty);
        }
        let n = self.labels.len();
        if self.mfccs.rows() != n {
            return Err(DataError::ShapeMismatch(format!(
                "mfccs has {} examples but labels has {}",
                self.mfccs.rows(), n
            )));
        }
        if self.features.rows() != n {
            return Err(DataError::ShapeMismatch(format!(
                "features has {} examples but labels has {}",
                self.features.rows(), n
            )));
        }
        Ok(n)
    }
}

/// Any component that can produce the raw training arrays.
pub trait DatasetSource {
    fn load_all(&self) -> Result<RawDataset, DataError>;
}
