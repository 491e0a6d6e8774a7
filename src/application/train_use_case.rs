// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load features / MFCCs / labels (Layer 4 - data)
//   Step 2: Fit label encoder, one-hot     (Layer 4 - data)
//   Step 3: Reshape MFCCs into grids       (Layer 3 - domain)
//   Step 4: Seeded train/test split        (Layer 4 - data)
//   Step 5: Save config and vocabulary     (Layer 6 - infra)
//   Step 6: Run training loop              (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use std::{fmt, path::PathBuf, str::FromStr};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::MfccDataset,
    label_encoder::LabelEncoder,
    loader::NpyDatasetLoader,
    splitter::split_indices,
};
use crate::domain::{features::GridShape, traits::DatasetSource};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::trainer::{run_training, TrainingReport};

// ─── Backend selection ───────────────────────────────────────────────────────
/// Compute backend the model runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GPU through wgpu (Vulkan / Metal / DX12)
    Wgpu,
    /// CPU through ndarray
    NdArray,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wgpu"    => Ok(Self::Wgpu),
            "ndarray" => Ok(Self::NdArray),
            other     => Err(format!("unknown backend '{other}' (expected wgpu or ndarray)")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wgpu    => f.write_str("wgpu"),
            Self::NdArray => f.write_str("ndarray"),
        }
    }
}

// ─── Training Configuration ──────────────────────────────────────────────────
// All inputs, outputs and hyperparameters for a training run.
// Serialisable so it can be saved next to the model and reloaded
// by `evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub features_path:     PathBuf,
    pub mfccs_path:        PathBuf,
    pub labels_path:       PathBuf,
    pub checkpoint_path:   PathBuf,
    pub model_output_path: PathBuf,
    pub metrics_path:      PathBuf,
    pub epochs:            usize,
    pub batch_size:        usize,
    pub test_fraction:     f64,
    pub seed:              u64,
    pub learning_rate:     f64,
    pub dropout:           f64,
    pub backend:           BackendKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            features_path:     "features.npy".into(),
            mfccs_path:        "mfccs.npy".into(),
            labels_path:       "labels.npy".into(),
            checkpoint_path:   "saved_models/checkpoint".into(),
            model_output_path: "saved_models/soundboy_model".into(),
            metrics_path:      "saved_models/metrics.csv".into(),
            epochs:            50,
            batch_size:        128,
            test_fraction:     0.2,
            seed:              42,
            learning_rate:     1e-3,
            dropout:           0.2,
            backend:           BackendKind::Wgpu,
        }
    }
}

impl TrainConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            bail!("epochs must be at least 1");
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            bail!("test_fraction must be in (0, 1), got {}", self.test_fraction);
        }
        if !(0.0..1.0).contains(&self.dropout) {
            bail!("dropout must be in [0, 1), got {}", self.dropout);
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            bail!("learning_rate must be positive, got {}", self.learning_rate);
        }
        Ok(())
    }
}

// ─── Prepared data ───────────────────────────────────────────────────────────
/// Encoded, reshaped and split data ready for the loaders.
pub struct PreparedData {
    pub encoder: LabelEncoder,
    pub grid:    GridShape,
    pub train:   MfccDataset,
    pub test:    MfccDataset,
}

/// Steps 1–4: load, encode, reshape and split.
pub fn prepare_data(cfg: &TrainConfig) -> Result<PreparedData> {
    // ── Step 1: Load the three arrays ────────────────────────────────────────
    let loader = NpyDatasetLoader::new(&cfg.features_path, &cfg.mfccs_path, &cfg.labels_path);
    let raw    = loader.load_all().context("Cannot load training data")?;
    let total  = raw.labels.len();
    println!("features: {:?}  mfccs: {:?}", raw.features.shape(), raw.mfccs.shape());

    // ── Step 2: Label vocabulary and one-hot targets ─────────────────────────
    let encoder = LabelEncoder::fit(&raw.labels);
    let targets = encoder.to_categorical(&raw.labels)?;
    println!("{} classes: {}", encoder.num_classes(), encoder.classes().join(", "));

    // ── Step 3: Flat MFCC rows → (40, 108, 1) grids ──────────────────────────
    let grid  = GridShape::mfcc();
    let grids = raw.mfccs.reshape_to_grid(grid).context("Cannot reshape MFCCs")?;

    // ── Step 4: Seeded train / test split ────────────────────────────────────
    let split         = split_indices(total, cfg.test_fraction, cfg.seed);
    let dataset       = MfccDataset::from_grids(&grids, &targets)?;
    let (train, test) = dataset.split(&split);

    println!(
        "x_train: ({}, {}, {}, {})  x_test: ({}, {}, {}, {})",
        train.sample_count(), grid.rows, grid.cols, grid.channels,
        test.sample_count(),  grid.rows, grid.cols, grid.channels,
    );
    tracing::info!(
        "Split {} examples: {} train, {} test (seed {})",
        total, train.sample_count(), test.sample_count(), cfg.seed
    );

    Ok(PreparedData { encoder, grid, train, test })
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg = &self.config;
        cfg.validate()?;

        let data = prepare_data(cfg)?;
        if data.train.sample_count() == 0 {
            bail!("No training examples left after the split");
        }

        // ── Step 5: Persist config and vocabulary for `evaluate` ─────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_path, &cfg.model_output_path)?;
        ckpt_manager.save_config(cfg)?;
        ckpt_manager.save_labels(&data.encoder)?;

        let metrics = MetricsLogger::create(&cfg.metrics_path)?;
        tracing::info!("Logging epoch metrics to '{}'", metrics.csv_path().display());

        // ── Step 6: Run training loop (Layer 5) ──────────────────────────────
        run_training(cfg, data, &ckpt_manager, &metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_fixed_pipeline() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.epochs, 50);
        assert_eq!(cfg.batch_size, 128);
        assert_eq!(cfg.test_fraction, 0.2);
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.mfccs_path, PathBuf::from("mfccs.npy"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            TrainConfig { epochs: 0, ..TrainConfig::default() },
            TrainConfig { batch_size: 0, ..TrainConfig::default() },
            TrainConfig { test_fraction: 0.0, ..TrainConfig::default() },
            TrainConfig { test_fraction: 1.0, ..TrainConfig::default() },
            TrainConfig { dropout: 1.0, ..TrainConfig::default() },
            TrainConfig { learning_rate: 0.0, ..TrainConfig::default() },
            TrainConfig { learning_rate: f64::NAN, ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err());
        }
    }

    #[test]
    fn test_backend_parses_case_insensitively() {
        assert_eq!("NdArray".parse::<BackendKind>().unwrap(), BackendKind::NdArray);
        assert_eq!("wgpu".parse::<BackendKind>().unwrap(), BackendKind::Wgpu);
        assert!("cuda".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_config_json_round_trip_keeps_backend_name() {
        let cfg  = TrainConfig { backend: BackendKind::NdArray, ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"backend\":\"ndarray\""));
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.backend, BackendKind::NdArray);
    }
}
