// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model state using Burn's CompactRecorder.
//
// Two independent artifacts:
//
//   best checkpoint   — overwritten whenever validation accuracy
//                       beats every earlier epoch of the run
//     saved_models/checkpoint.mpk
//     saved_models/checkpoint.json        epoch + val accuracy
//
//   final model       — written once after the last epoch,
//                       regardless of how it scored
//     saved_models/soundboy_model.mpk          weights
//     saved_models/soundboy_model_optim.mpk    Adam state
//     saved_models/soundboy_model_config.json  architecture
//     saved_models/soundboy_model_train.json   TrainConfig
//     saved_models/soundboy_model_labels.json  class vocabulary
//
// The recorder appends .mpk itself, so sibling files use a
// suffix on the file name rather than an extra extension.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};
use burn::{
    optim::Optimizer,
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::label_encoder::LabelEncoder;
use crate::ml::model::{AudioCnn, AudioCnnConfig};

/// Metadata written next to the best checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointInfo {
    pub epoch:        usize,
    pub val_accuracy: f64,
}

/// Tracks the best validation score of a run.
/// A score counts as an improvement only if it is finite and
/// strictly greater than every score seen before it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestScore {
    best: Option<f64>,
}

impl BestScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `score`; returns true if it is a new best.
    pub fn update(&mut self, score: f64) -> bool {
        if !score.is_finite() {
            return false;
        }
        match self.best {
            Some(best) if score <= best => false,
            _ => {
                self.best = Some(score);
                true
            }
        }
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }
}

/// Manages saving and loading of checkpoints and the final model.
pub struct CheckpointManager {
    checkpoint: PathBuf,
    model:      PathBuf,
}

impl CheckpointManager {
    /// Create parent directories for both artifacts.
    pub fn new(checkpoint: impl Into<PathBuf>, model: impl Into<PathBuf>) -> Result<Self> {
        let manager = Self {
            checkpoint: checkpoint.into(),
            model:      model.into(),
        };
        for path in [&manager.checkpoint, &manager.model] {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Cannot create directory '{}'", dir.display()))?;
            }
        }
        Ok(manager)
    }

    /// Overwrite the best checkpoint with the current weights.
    pub fn save_best<B: Backend>(&self, model: &AudioCnn<B>, info: CheckpointInfo) -> Result<()> {
        CompactRecorder::new()
            .record(model.clone().into_record(), self.checkpoint.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", self.checkpoint.display())
            })?;

        write_json(&self.checkpoint.with_extension("json"), &info)?;
        tracing::debug!("Saved checkpoint: epoch {} ({:.4})", info.epoch, info.val_accuracy);
        Ok(())
    }

    /// Metadata of the last best checkpoint written.
    pub fn load_checkpoint_info(&self) -> Result<CheckpointInfo> {
        read_json(&self.checkpoint.with_extension("json"))
    }

    /// Rebuild the saved architecture and load the best checkpoint's weights.
    pub fn load_best<B: Backend>(&self, device: &B::Device) -> Result<(AudioCnnConfig, AudioCnn<B>)> {
        let config = self.load_model_config()?;
        let info   = self.load_checkpoint_info()?;
        tracing::info!(
            "Loading checkpoint from epoch {} (val accuracy {:.4})",
            info.epoch, info.val_accuracy
        );

        let record = CompactRecorder::new()
            .load(self.checkpoint.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'", self.checkpoint.display())
            })?;

        let model = config.init::<B>(device).load_record(record);
        Ok((config, model))
    }

    /// Persist the trained model: architecture, weights and optimizer state.
    pub fn save_final<B, O>(
        &self,
        model:     &AudioCnn<B>,
        optimizer: &O,
        config:    &AudioCnnConfig,
    ) -> Result<()>
    where
        B: AutodiffBackend,
        O: Optimizer<AudioCnn<B>, B>,
    {
        let config_path = self.sibling("_config.json");
        config
            .save(&config_path)
            .with_context(|| format!("Cannot write model config to '{}'", config_path.display()))?;

        CompactRecorder::new()
            .record(model.clone().into_record(), self.model.clone())
            .with_context(|| format!("Failed to save model to '{}'", self.model.display()))?;

        let optim_path = self.sibling("_optim");
        CompactRecorder::new()
            .record(optimizer.to_record(), optim_path.clone())
            .with_context(|| {
                format!("Failed to save optimizer state to '{}'", optim_path.display())
            })?;

        tracing::info!("Saved final model to '{}'", self.model.display());
        Ok(())
    }

    /// Rebuild the saved architecture and load the final weights.
    pub fn load_final<B: Backend>(&self, device: &B::Device) -> Result<(AudioCnnConfig, AudioCnn<B>)> {
        let config = self.load_model_config()?;

        let record = CompactRecorder::new()
            .load(self.model.clone(), device)
            .with_context(|| format!("Cannot load model '{}'", self.model.display()))?;

        let model = config.init::<B>(device).load_record(record);
        Ok((config, model))
    }

    fn load_model_config(&self) -> Result<AudioCnnConfig> {
        let config_path = self.sibling("_config.json");
        AudioCnnConfig::load(&config_path).with_context(|| {
            format!(
                "Cannot read model config '{}'. Have you run 'train' first?",
                config_path.display()
            )
        })
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        write_json(&self.sibling("_train.json"), cfg)
    }

    /// TrainConfig saved next to a final model, before a manager exists.
    pub fn read_train_config(model: &Path) -> Result<TrainConfig> {
        read_json(&sibling_of(model, "_train.json"))
    }

    pub fn save_labels(&self, encoder: &LabelEncoder) -> Result<()> {
        write_json(&self.sibling("_labels.json"), encoder)
    }

    pub fn load_labels(&self) -> Result<LabelEncoder> {
        read_json(&self.sibling("_labels.json"))
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        sibling_of(&self.model, suffix)
    }
}

/// `<model path><suffix>`, e.g. soundboy_model + "_train.json".
fn sibling_of(model: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(model.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))?;
    tracing::debug!("Wrote '{}'", path.display());
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path).with_context(|| {
        format!("Cannot read '{}'. Have you run 'train' first?", path.display())
    })?;
    serde_json::from_str(&json).with_context(|| format!("Malformed JSON in '{}'", path.display()))
}
