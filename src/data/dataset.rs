use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::splitter::Split;
use crate::domain::{error::DataError, features::MfccGrids, labels::OneHotLabels};

/// One clip: a flat (rows, cols, channels) MFCC grid and its one-hot target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfccSample {
    pub grid:   Vec<f32>,
    pub target: Vec<f32>,
}

#[derive(Clone)]
pub struct MfccDataset {
    samples: Vec<MfccSample>,
}

impl MfccDataset {
    pub fn new(samples: Vec<MfccSample>) -> Self { Self { samples } }

    /// Pair every grid with its one-hot row.
    pub fn from_grids(grids: &MfccGrids, targets: &OneHotLabels) -> Result<Self, DataError> {
        if grids.is_empty() {
            return Err(DataError::Empty);
        }
        if grids.len() != targets.len() {
            return Err(DataError::ShapeMismatch(format!(
                "{} MFCC grids but {} label rows",
                grids.len(), targets.len()
            )));
        }
        let samples = (0..grids.len())
            .map(|i| MfccSample {
                grid:   grids.example(i).to_vec(),
                target: targets.row(i).to_vec(),
            })
            .collect();
        Ok(Self { samples })
    }

    /// (train, test) datasets for an index split.
    pub fn split(self, split: &Split) -> (Self, Self) {
        let pick = |indices: &[usize]| {
            Self::new(indices.iter().map(|&i| self.samples[i].clone()).collect())
        };
        (pick(&split.train), pick(&split.test))
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<MfccSample> for MfccDataset {
    fn get(&self, index: usize) -> Option<MfccSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::splitter::split_indices;
    use crate::domain::features::{FeatureMatrix, GridShape};

    fn grids(n: usize) -> MfccGrids {
        let len    = GridShape::mfcc().len();
        let values = (0..n * len).map(|v| (v / len) as f32).collect();
        FeatureMatrix::new(vec![n, len], values)
            .unwrap()
            .reshape_to_grid(GridShape::mfcc())
            .unwrap()
    }

    #[test]
    fn test_thousand_clip_split_shapes() {
        let n       = 1000;
        let classes: Vec<usize> = (0..n).map(|i| i % 10).collect();
        let targets = OneHotLabels::from_indices(&classes, 10);
        let grids   = grids(n);
        assert_eq!(grids.shape(), [1000, 40, 108, 1]);

        let dataset       = MfccDataset::from_grids(&grids, &targets).unwrap();
        let (train, test) = dataset.split(&split_indices(n, 0.2, 42));

        assert_eq!(train.len(), 800);
        assert_eq!(test.len(),  200);
        assert_eq!(train.get(0).unwrap().grid.len(), 40 * 108);
        assert_eq!(test.get(0).unwrap().target.len(), 10);
    }

    #[test]
    fn test_samples_keep_grid_and_target_together() {
        let classes = [0, 1, 2, 0];
        let targets = OneHotLabels::from_indices(&classes, 3);
        let dataset = MfccDataset::from_grids(&grids(4), &targets).unwrap();

        let split         = split_indices(4, 0.25, 1);
        let (_, test)     = dataset.split(&split);
        let original      = split.test[0];
        let sample        = test.get(0).unwrap();
        assert_eq!(sample.grid[0], original as f32);
        assert_eq!(sample.target[classes[original]], 1.0);
    }

    #[test]
    fn test_count_mismatch_rejected() {
        let targets = OneHotLabels::from_indices(&[0, 1], 2);
        assert!(MfccDataset::from_grids(&grids(3), &targets).is_err());
    }

    #[test]
    fn test_no_grids_rejected() {
        let targets = OneHotLabels::from_indices(&[], 2);
        assert!(matches!(
            MfccDataset::from_grids(&grids(0), &targets),
            Err(DataError::Empty)
        ));
    }
}
