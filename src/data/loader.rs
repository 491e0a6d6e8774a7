// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Loads the three arrays the feature-extraction step saved:
//
//   features.npy   raw per-clip features       (N, F)
//   mfccs.npy      MFCC grids, flat or 3-D     (N, 40, 108) / (N, 4320)
//   labels.npy     class name per clip         (N,)
//
// Any missing or malformed file is fatal: nothing downstream
// can run without all three.

use std::path::{Path, PathBuf};

use crate::data::npy::read_npy;
use crate::domain::{
    error::DataError,
    traits::{DatasetSource, RawDataset},
};

/// Reads features, MFCCs and labels from .npy files.
pub struct NpyDatasetLoader {
    features_path: PathBuf,
    mfccs_path:    PathBuf,
    labels_path:   PathBuf,
}

impl NpyDatasetLoader {
    pub fn new(
        features_path: impl Into<PathBuf>,
        mfccs_path:    impl Into<PathBuf>,
        labels_path:   impl Into<PathBuf>,
    ) -> Self {
        Self {
            features_path: features_path.into(),
            mfccs_path:    mfccs_path.into(),
            labels_path:   labels_path.into(),
        }
    }
}

impl DatasetSource for NpyDatasetLoader {
    fn load_all(&self) -> Result<RawDataset, DataError> {
        let features = load_matrix(&self.features_path)?;
        let mfccs    = load_matrix(&self.mfccs_path)?;
        let labels   = read_npy(&self.labels_path)?.into_labels()?;

        let raw = RawDataset { features, mfccs, labels };
        let n   = raw.validate()?;

        tracing::info!(
            "Loaded {} examples: features {:?}, mfccs {:?}",
            n,
            raw.features.shape(),
            raw.mfccs.shape(),
        );
        Ok(raw)
    }
}

fn load_matrix(path: &Path) -> Result<crate::domain::features::FeatureMatrix, DataError> {
    let array = read_npy(path)?;
    tracing::debug!("{}: shape {:?}", path.display(), array.shape());
    array.into_features()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::npy::fixtures::{write_f32, write_labels};

    fn write_set(dir: &Path, n_mfcc: usize, labels: &[&str]) -> NpyDatasetLoader {
        let features = dir.join("features.npy");
        let mfccs    = dir.join("mfccs.npy");
        let label_p  = dir.join("labels.npy");
        write_f32(&features, &[labels.len(), 2], &vec![0.5; labels.len() * 2]);
        write_f32(&mfccs, &[n_mfcc, 4, 3], &vec![1.0; n_mfcc * 12]);
        write_labels(&label_p, labels);
        NpyDatasetLoader::new(features, mfccs, label_p)
    }

    #[test]
    fn test_loads_three_arrays() {
        let dir    = tempfile::tempdir().unwrap();
        let loader = write_set(dir.path(), 3, &["a", "b", "a"]);
        let raw    = loader.load_all().unwrap();
        assert_eq!(raw.mfccs.shape(), &[3, 4, 3]);
        assert_eq!(raw.mfccs.row_len(), 12);
        assert_eq!(raw.labels.len(), 3);
        assert_eq!(raw.features.rows(), 3);
    }

    #[test]
    fn test_row_mismatch_is_fatal() {
        let dir    = tempfile::tempdir().unwrap();
        let loader = write_set(dir.path(), 2, &["a", "b", "a"]);
        assert!(matches!(loader.load_all(), Err(DataError::ShapeMismatch(_))));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir    = tempfile::tempdir().unwrap();
        let loader = NpyDatasetLoader::new(
            dir.path().join("features.npy"),
            dir.path().join("mfccs.npy"),
            dir.path().join("labels.npy"),
        );
        assert!(matches!(loader.load_all(), Err(DataError::Read { .. })));
    }
}
