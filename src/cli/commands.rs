// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `evaluate`
// and all their configurable flags.
//
// Every default below reproduces the fixed pipeline: features.npy,
// mfccs.npy and labels.npy in the working directory, a 0.2 test
// split with seed 42, 50 epochs of batch size 128.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::train_use_case::{BackendKind, TrainConfig};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the MFCC classifier and save the final model
    Train(TrainArgs),

    /// Re-score a saved model on the same train/test split
    Evaluate(EvaluateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Per-clip summary features, shape (N, F)
    #[arg(long, default_value = "features.npy")]
    pub features_path: PathBuf,

    /// Flattened MFCCs, shape (N, 4320)
    #[arg(long, default_value = "mfccs.npy")]
    pub mfccs_path: PathBuf,

    /// Class name per clip, shape (N,)
    #[arg(long, default_value = "labels.npy")]
    pub labels_path: PathBuf,

    /// Best checkpoint location (.mpk is appended)
    #[arg(long, default_value = "saved_models/checkpoint")]
    pub checkpoint_path: PathBuf,

    /// Final model location (.mpk is appended)
    #[arg(long, default_value = "saved_models/soundboy_model")]
    pub model_output_path: PathBuf,

    /// Per-epoch metrics CSV
    #[arg(long, default_value = "saved_models/metrics.csv")]
    pub metrics_path: PathBuf,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 50)]
    pub epochs: usize,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    /// Share of examples held out for testing
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for the split and for batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Adam step size
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Dropout probability after every conv block
    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    /// Compute backend: wgpu or ndarray
    #[arg(long, default_value = "wgpu")]
    pub backend: BackendKind,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            features_path:     a.features_path,
            mfccs_path:        a.mfccs_path,
            labels_path:       a.labels_path,
            checkpoint_path:   a.checkpoint_path,
            model_output_path: a.model_output_path,
            metrics_path:      a.metrics_path,
            epochs:            a.epochs,
            batch_size:        a.batch_size,
            test_fraction:     a.test_fraction,
            seed:              a.seed,
            learning_rate:     a.lr,
            dropout:           a.dropout,
            backend:           a.backend,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Final model written by `train`; its saved config supplies the data paths
    #[arg(long, default_value = "saved_models/soundboy_model")]
    pub model_output_path: PathBuf,

    /// Score the best checkpoint instead of the final weights
    #[arg(long)]
    pub best: bool,

    /// Override the backend recorded at training time
    #[arg(long)]
    pub backend: Option<BackendKind>,
}
