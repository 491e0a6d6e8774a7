// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Re-scores a finished run without training:
//   1. Read the TrainConfig saved next to the model
//   2. Rebuild the same encoder and seeded split from the data
//   3. Check the vocabulary matches the one the model was trained on
//   4. Load the final model (or the best checkpoint) and report
//      train / test accuracy

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::application::train_use_case::{prepare_data, BackendKind};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::evaluator::{evaluate_saved, Evaluation, ModelSource};

pub struct EvaluateUseCase {
    model_output_path: PathBuf,
    source:            ModelSource,
    backend:           Option<BackendKind>,
}

impl EvaluateUseCase {
    pub fn new(
        model_output_path: impl Into<PathBuf>,
        source:            ModelSource,
        backend:           Option<BackendKind>,
    ) -> Self {
        Self {
            model_output_path: model_output_path.into(),
            source,
            backend,
        }
    }

    /// Returns (train, test) evaluations of the saved model.
    pub fn execute(&self) -> Result<(Evaluation, Evaluation)> {
        let cfg  = CheckpointManager::read_train_config(&self.model_output_path)?;
        let ckpt = CheckpointManager::new(&cfg.checkpoint_path, &self.model_output_path)?;

        let saved_labels = ckpt.load_labels()?;
        let data         = prepare_data(&cfg)?;
        if saved_labels != data.encoder {
            bail!(
                "Label vocabulary changed since training: model knows [{}], data has [{}]",
                saved_labels.classes().join(", "),
                data.encoder.classes().join(", ")
            );
        }

        let backend = self.backend.unwrap_or(cfg.backend);
        evaluate_saved(self.source, backend, cfg.batch_size, data, &ckpt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use crate::application::train_use_case::{TrainConfig, TrainUseCase};
    use crate::data::npy::fixtures::{write_f32, write_labels};
    use crate::domain::features::GridShape;

    /// Twelve clips, three classes, each class a different constant level.
    fn write_dataset(dir: &std::path::Path) -> TrainConfig {
        let n      = 12;
        let len    = GridShape::mfcc().len();
        let names  = ["dog_bark", "siren", "drill"];
        let labels: Vec<&str> = (0..n).map(|i| names[i % 3]).collect();
        let mfccs: Vec<f32>   = (0..n)
            .flat_map(|i| std::iter::repeat((i % 3) as f32 - 1.0).take(len))
            .collect();
        let features: Vec<f32> = (0..n * 2).map(|v| v as f32).collect();

        write_f32(&dir.join("features.npy"), &[n, 2], &features);
        write_f32(&dir.join("mfccs.npy"), &[n, len], &mfccs);
        write_labels(&dir.join("labels.npy"), &labels);

        TrainConfig {
            features_path:     dir.join("features.npy"),
            mfccs_path:        dir.join("mfccs.npy"),
            labels_path:       dir.join("labels.npy"),
            checkpoint_path:   dir.join("saved_models/checkpoint"),
            model_output_path: dir.join("saved_models/soundboy_model"),
            metrics_path:      dir.join("saved_models/metrics.csv"),
            epochs:            2,
            batch_size:        4,
            backend:           BackendKind::NdArray,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_train_then_evaluate_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = write_dataset(dir.path());

        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(report.train.samples, 9);
        assert_eq!(report.test.samples,  3);
        assert_eq!(report.baseline.samples, 3);
        assert_eq!(report.epochs.len(), 2);

        // A row is checkpointed only if it beats every earlier val_acc.
        let mut best = f64::NEG_INFINITY;
        for row in &report.epochs {
            assert_eq!(row.checkpointed, row.val_acc > best);
            best = best.max(row.val_acc);
        }
        assert!(report.epochs[0].checkpointed);

        // The file on disk holds the last epoch that improved.
        let last_improved = report.epochs.iter().rev().find(|r| r.checkpointed).unwrap();
        let on_disk = CheckpointManager::new(&cfg.checkpoint_path, &cfg.model_output_path)
            .unwrap()
            .load_checkpoint_info()
            .unwrap();
        assert_eq!(on_disk.epoch, last_improved.epoch);
        assert_eq!(on_disk.val_accuracy, last_improved.val_acc);
        assert_eq!(report.best, Some(on_disk));

        let models = dir.path().join("saved_models");
        for file in [
            "checkpoint.mpk",
            "checkpoint.json",
            "soundboy_model.mpk",
            "soundboy_model_optim.mpk",
            "soundboy_model_config.json",
            "soundboy_model_train.json",
            "soundboy_model_labels.json",
        ] {
            assert!(models.join(file).exists(), "missing {file}");
        }
        let csv = fs::read_to_string(&cfg.metrics_path).unwrap();
        assert_eq!(csv.lines().count(), 3);

        let (train, test) = EvaluateUseCase::new(&cfg.model_output_path, ModelSource::Final, None)
            .execute()
            .unwrap();
        assert_eq!(train.samples, 9);
        assert_eq!(test.samples,  3);
        assert!((0.0..=1.0).contains(&test.accuracy));

        let (_, best_test) =
            EvaluateUseCase::new(&cfg.model_output_path, ModelSource::BestCheckpoint, None)
                .execute()
                .unwrap();
        assert_eq!(best_test.samples, 3);
    }

    #[test]
    fn test_changed_vocabulary_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = write_dataset(dir.path());
        TrainUseCase::new(TrainConfig { epochs: 1, ..cfg.clone() }).execute().unwrap();

        let renamed: Vec<&str> = (0..12).map(|i| ["cat", "siren", "drill"][i % 3]).collect();
        write_labels(&cfg.labels_path, &renamed);

        let err = EvaluateUseCase::new(&cfg.model_output_path, ModelSource::Final, None)
            .execute()
            .unwrap_err();
        assert!(err.to_string().contains("vocabulary"));
    }

    #[test]
    fn test_evaluate_without_training_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = EvaluateUseCase::new(dir.path().join("nothing"), ModelSource::Final, None).execute();
        assert!(result.is_err());
    }
}
