// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:        the epoch number (1, 2, 3, ...)
//   - train_loss:   mean cross-entropy over the training batches
//   - train_acc:    accuracy over the training batches (dropout on)
//   - val_loss:     mean cross-entropy on the test set
//   - val_acc:      accuracy on the test set
//   - checkpointed: 1 if this epoch overwrote the best checkpoint
//
// Output file: saved_models/metrics.csv (recreated every run)
//
// Example CSV output:
//   epoch,train_loss,train_acc,val_loss,val_acc,checkpointed
//   1,2.245100,0.153750,2.189200,0.190000,1
//   2,2.010300,0.241250,1.954300,0.245000,1

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:        usize,
    pub train_loss:   f64,
    pub train_acc:    f64,
    pub val_loss:     f64,
    pub val_acc:      f64,
    pub checkpointed: bool,
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create (or truncate) the CSV and write the header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let csv_path = path.as_ref().to_path_buf();

        if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create metrics file '{}'", csv_path.display()))?;
        writeln!(f, "epoch,train_loss,train_acc,val_loss,val_acc,checkpointed")?;
        tracing::debug!("Created metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{}",
            m.epoch,
            m.train_loss,
            m.train_acc,
            m.val_loss,
            m.val_acc,
            u8::from(m.checkpointed),
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
