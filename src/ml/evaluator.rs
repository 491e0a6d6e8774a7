// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Loss and accuracy of a model over a whole data loader, with
// no gradient tracking. Used for the pre-training baseline,
// the per-epoch validation pass and the final train/test
// report.

use std::sync::Arc;

use anyhow::{bail, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};

use crate::application::train_use_case::{BackendKind, PreparedData};
use crate::data::{
    batcher::{MfccBatch, MfccBatcher},
    dataset::MfccDataset,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::{correct_predictions, AudioCnn};

/// Averaged metrics over one pass of a data loader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Mean categorical cross-entropy per sample.
    pub loss:     f64,
    /// Fraction of samples classified correctly, in [0, 1].
    pub accuracy: f64,
    pub samples:  usize,
}

impl Evaluation {
    /// Fold per-batch sums into averages.
    pub fn from_totals(loss_sum: f64, correct: usize, samples: usize) -> Self {
        if samples == 0 {
            return Self { loss: f64::NAN, accuracy: 0.0, samples };
        }
        Self {
            loss:     loss_sum / samples as f64,
            accuracy: correct as f64 / samples as f64,
            samples,
        }
    }
}

/// Run the model over every batch and average loss and accuracy.
/// Pass a model on a non-autodiff backend (`model.valid()`) so
/// dropout is off and no graph is recorded.
pub fn evaluate<B: Backend>(
    model:  &AudioCnn<B>,
    loader: &Arc<dyn DataLoader<MfccBatch<B>>>,
) -> Evaluation {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut samples  = 0usize;

    for batch in loader.iter() {
        let batch_len      = batch.targets.dims()[0];
        let (loss, logits) = model.forward_loss(batch.inputs, batch.targets.clone());

        // forward_loss averages over the batch; weight by size so a
        // short final batch does not skew the mean.
        loss_sum += loss.into_scalar().elem::<f64>() * batch_len as f64;
        correct  += correct_predictions(logits, batch.targets);
        samples  += batch_len;
    }

    Evaluation::from_totals(loss_sum, correct, samples)
}

/// Which saved weights to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelSource {
    /// Weights written after the last epoch.
    #[default]
    Final,
    /// Best-validation-accuracy checkpoint.
    BestCheckpoint,
}

/// Reload a saved model and score it on the train and test sets.
pub fn evaluate_saved(
    source:       ModelSource,
    backend:      BackendKind,
    batch_size:   usize,
    data:         PreparedData,
    ckpt_manager: &CheckpointManager,
) -> Result<(Evaluation, Evaluation)> {
    match backend {
        BackendKind::Wgpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            evaluate_saved_on::<Wgpu>(source, batch_size, data, ckpt_manager, device)
        }
        BackendKind::NdArray => {
            evaluate_saved_on::<NdArray>(source, batch_size, data, ckpt_manager, NdArrayDevice::default())
        }
    }
}

fn evaluate_saved_on<B: Backend>(
    source:       ModelSource,
    batch_size:   usize,
    data:         PreparedData,
    ckpt_manager: &CheckpointManager,
    device:       B::Device,
) -> Result<(Evaluation, Evaluation)> {
    let (model_cfg, model) = match source {
        ModelSource::Final          => ckpt_manager.load_final::<B>(&device)?,
        ModelSource::BestCheckpoint => ckpt_manager.load_best::<B>(&device)?,
    };
    if model_cfg.num_classes != data.encoder.num_classes() {
        bail!(
            "Saved model predicts {} classes but the data has {}",
            model_cfg.num_classes,
            data.encoder.num_classes()
        );
    }

    let loader = |dataset: MfccDataset| {
        DataLoaderBuilder::new(MfccBatcher::<B>::new(device.clone(), data.grid))
            .batch_size(batch_size)
            .num_workers(1)
            .build(dataset)
    };
    let train = evaluate(&model, &loader(data.train));
    let test  = evaluate(&model, &loader(data.test));
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::MfccSample;
    use crate::domain::features::GridShape;
    use crate::ml::model::AudioCnnConfig;

    type TestBackend = NdArray;

    #[test]
    fn test_from_totals_averages() {
        let e = Evaluation::from_totals(6.0, 3, 4);
        assert_eq!(e.loss, 1.5);
        assert_eq!(e.accuracy, 0.75);
        assert!(Evaluation::from_totals(0.0, 0, 0).loss.is_nan());
    }

    #[test]
    fn test_evaluate_counts_every_sample() {
        let device = Default::default();
        let model: AudioCnn<TestBackend> = AudioCnnConfig::for_grid(2, GridShape::mfcc(), 0.0).init(&device);
        let grid   = GridShape::mfcc();
        let samples = (0..5)
            .map(|i| MfccSample {
                grid:   vec![i as f32 * 0.1; grid.len()],
                target: if i % 2 == 0 { vec![1.0, 0.0] } else { vec![0.0, 1.0] },
            })
            .collect();
        let loader = DataLoaderBuilder::new(MfccBatcher::<TestBackend>::new(device, grid))
            .batch_size(2)
            .build(MfccDataset::new(samples));

        let eval = evaluate(&model, &loader);

        assert_eq!(eval.samples, 5);
        assert!(eval.loss.is_finite() && eval.loss > 0.0);
        assert!((0.0..=1.0).contains(&eval.accuracy));
    }
}
