// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Baseline → epochs → final report, using Burn's DataLoader
// and Adam.
//
//   1. Evaluate the untrained model on the test set (baseline,
//      printed only, never gates anything)
//   2. For each epoch: one shuffled pass over the training set
//      with gradient updates, then a validation pass over the
//      test set. The test set never updates parameters.
//   3. Overwrite the best checkpoint when validation accuracy
//      beats every earlier epoch.
//   4. Re-evaluate on train and test, save the final model.
//
// Key Burn insight:
//   - Training runs on Autodiff<Backend> for gradients
//   - model.valid() returns the model on the inner backend with
//     dropout disabled; evaluation batchers use that backend too
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use std::time::{Duration, Instant};

use anyhow::Result;
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::{BackendKind, PreparedData, TrainConfig};
use crate::data::batcher::MfccBatcher;
use crate::infra::{
    checkpoint::{BestScore, CheckpointInfo, CheckpointManager},
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::evaluator::{evaluate, Evaluation};
use crate::ml::model::{correct_predictions, format_summary, AudioCnn, AudioCnnConfig};

/// What a finished run reports back to the caller.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub baseline: Evaluation,
    pub epochs:   Vec<EpochMetrics>,
    pub best:     Option<CheckpointInfo>,
    pub duration: Duration,
    pub train:    Evaluation,
    pub test:     Evaluation,
}

pub fn run_training(
    cfg:          &TrainConfig,
    data:         PreparedData,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
) -> Result<TrainingReport> {
    match cfg.backend {
        BackendKind::Wgpu => {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<Autodiff<Wgpu>>(cfg, data, ckpt_manager, metrics, device)
        }
        BackendKind::NdArray => {
            let device = NdArrayDevice::default();
            tracing::info!("Using NdArray device: {:?}", device);
            train_loop::<Autodiff<NdArray>>(cfg, data, ckpt_manager, metrics, device)
        }
    }
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:          &TrainConfig,
    data:         PreparedData,
    ckpt_manager: &CheckpointManager,
    metrics:      &MetricsLogger,
    device:       B::Device,
) -> Result<TrainingReport> {
    let PreparedData { encoder, grid, train, test } = data;

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = AudioCnnConfig::for_grid(encoder.num_classes(), grid, cfg.dropout);
    let mut model: AudioCnn<B> = model_cfg.init(&device);
    println!("{}", format_summary(&model_cfg.layer_summaries()));
    tracing::info!("Model ready: {} parameters, {} classes", model.num_params(), model_cfg.num_classes);

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-7).init();

    // ── Data loaders ──────────────────────────────────────────────────────────
    // Training batches carry the autodiff backend; everything that is
    // only evaluated uses the inner backend.
    let train_loader = DataLoaderBuilder::new(MfccBatcher::<B>::new(device.clone(), grid))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .num_workers(1)
        .build(train.clone());

    let train_eval_loader = DataLoaderBuilder::new(MfccBatcher::<B::InnerBackend>::new(device.clone(), grid))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(train);

    let test_loader = DataLoaderBuilder::new(MfccBatcher::<B::InnerBackend>::new(device.clone(), grid))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(test);

    // ── Pre-training baseline ─────────────────────────────────────────────────
    let baseline = evaluate(&model.valid(), &test_loader);
    println!("Pre-training accuracy: {:.4}%", baseline.accuracy * 100.0);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    let mut best    = BestScore::new();
    let mut best_ck = None;
    let mut history = Vec::with_capacity(cfg.epochs);
    let start       = Instant::now();

    for epoch in 1..=cfg.epochs {
        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut correct  = 0usize;
        let mut seen     = 0usize;

        for batch in train_loader.iter() {
            let batch_len      = batch.targets.dims()[0];
            let (loss, logits) = model.forward_loss(batch.inputs, batch.targets.clone());

            loss_sum += loss.clone().into_scalar().elem::<f64>() * batch_len as f64;
            correct  += correct_predictions(logits, batch.targets);
            seen     += batch_len;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }
        let train_eval = Evaluation::from_totals(loss_sum, correct, seen);

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → AudioCnn<B::InnerBackend>, dropout disabled
        let val = evaluate(&model.valid(), &test_loader);

        let checkpointed = best.update(val.accuracy);
        if checkpointed {
            let info = CheckpointInfo { epoch, val_accuracy: val.accuracy };
            ckpt_manager.save_best(&model, info)?;
            best_ck = Some(info);
        }

        println!(
            "Epoch {:>3}/{} | loss={:.4} | acc={:.4} | val_loss={:.4} | val_acc={:.4}{}",
            epoch, cfg.epochs, train_eval.loss, train_eval.accuracy,
            val.loss, val.accuracy,
            if checkpointed { " | checkpoint saved" } else { "" },
        );

        let row = EpochMetrics {
            epoch,
            train_loss: train_eval.loss,
            train_acc:  train_eval.accuracy,
            val_loss:   val.loss,
            val_acc:    val.accuracy,
            checkpointed,
        };
        metrics.log(&row)?;
        history.push(row);
    }

    let duration = start.elapsed();
    println!("Training completed in {:.2?}", duration);
    if let Some(score) = best.best() {
        tracing::info!("Best validation accuracy: {:.4}", score);
    }

    // ── Final evaluation ──────────────────────────────────────────────────────
    let final_model = model.valid();
    let train_final = evaluate(&final_model, &train_eval_loader);
    let test_final  = evaluate(&final_model, &test_loader);
    println!("Training Accuracy: {:.4}", train_final.accuracy);
    println!("Testing Accuracy: {:.4}", test_final.accuracy);

    // ── Persist ───────────────────────────────────────────────────────────────
    ckpt_manager.save_final(&model, &optim, &model_cfg)?;

    tracing::info!("Training complete!");
    Ok(TrainingReport {
        baseline,
        epochs: history,
        best:   best_ck,
        duration,
        train:  train_final,
        test:   test_final,
    })
}
