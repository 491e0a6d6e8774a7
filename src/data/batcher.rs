// ============================================================
// Layer 4 — MFCC Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<MfccSample>
// into the two tensors a training step needs.
//
// How batching works here:
//   Input:  N samples, each a flat (rows, cols, channels) grid
//   Output: inputs  [N, channels, rows, cols]
//           targets [N, classes]
//
// Samples are stored channels-last (the layout the features
// were saved in) while Burn's Conv2d expects channels-first,
// so the stacked tensor is permuted after reshaping.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::MfccSample;
use crate::domain::features::GridShape;

/// A batch of clips ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct MfccBatch<B: Backend> {
    /// MFCC grids — shape: [batch, channels, rows, cols]
    pub inputs: Tensor<B, 4>,

    /// One-hot targets — shape: [batch, classes]
    pub targets: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct MfccBatcher<B: Backend> {
    pub device: B::Device,
    pub grid:   GridShape,
}

impl<B: Backend> MfccBatcher<B> {
    pub fn new(device: B::Device, grid: GridShape) -> Self {
        Self { device, grid }
    }
}

impl<B: Backend> Batcher<MfccSample, MfccBatch<B>> for MfccBatcher<B> {
    fn batch(&self, items: Vec<MfccSample>) -> MfccBatch<B> {
        let batch_size  = items.len();
        let num_classes = items.first().map_or(0, |s| s.target.len());
        let GridShape { rows, cols, channels } = self.grid;

        let grid_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.grid.iter().copied())
            .collect();

        let target_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.target.iter().copied())
            .collect();

        // [batch, rows, cols, channels] → [batch, channels, rows, cols]
        let inputs = Tensor::<B, 1>::from_floats(grid_flat.as_slice(), &self.device)
            .reshape([batch_size, rows, cols, channels])
            .permute([0, 3, 1, 2]);

        let targets = Tensor::<B, 1>::from_floats(target_flat.as_slice(), &self.device)
            .reshape([batch_size, num_classes]);

        MfccBatch { inputs, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes_are_channels_first() {
        let grid    = GridShape::mfcc();
        let batcher = MfccBatcher::<TestBackend>::new(Default::default(), grid);
        let items   = (0..3)
            .map(|i| MfccSample {
                grid:   vec![i as f32; grid.len()],
                target: vec![0.0, 1.0, 0.0, 0.0],
            })
            .collect();

        let batch = batcher.batch(items);
        assert_eq!(batch.inputs.dims(),  [3, 1, 40, 108]);
        assert_eq!(batch.targets.dims(), [3, 4]);
    }

    #[test]
    fn test_channel_values_land_in_their_plane() {
        // 1 × 2 grid with 2 channels: (r0c0: 1, 2), (r0c1: 3, 4)
        let grid    = GridShape::new(1, 2, 2);
        let batcher = MfccBatcher::<TestBackend>::new(Default::default(), grid);
        let batch   = batcher.batch(vec![MfccSample {
            grid:   vec![1.0, 2.0, 3.0, 4.0],
            target: vec![1.0],
        }]);

        let values: Vec<f32> = batch.inputs.into_data().to_vec().unwrap();
        assert_eq!(values, vec![1.0, 3.0, 2.0, 4.0]);
    }
}
