// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — trains the CNN on the three .npy arrays
//   2. `evaluate` — reloads a saved model and reports accuracy
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

use crate::ml::evaluator::ModelSource;

#[derive(Parser, Debug)]
#[command(
    name = "soundboy",
    version = "0.1.0",
    about = "Train a CNN sound classifier on precomputed MFCC features."
)]
pub struct Cli {
    /// The subcommand to run (train or evaluate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

/// Handles the `train` subcommand.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.mfccs_path.display());

    let report = TrainUseCase::new(args.into()).execute()?;

    match report.best {
        Some(best) => println!(
            "Best checkpoint: epoch {} (val accuracy {:.4})",
            best.epoch, best.val_accuracy
        ),
        None => println!("No checkpoint written (validation accuracy was never finite)"),
    }
    tracing::info!(
        "{} epochs in {:.2?}; accuracy {:.4} → {:.4}",
        report.epochs.len(),
        report.duration,
        report.baseline.accuracy,
        report.test.accuracy
    );
    Ok(())
}

/// Handles the `evaluate` subcommand.
fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let source = if args.best { ModelSource::BestCheckpoint } else { ModelSource::Final };
    let (train, test) = EvaluateUseCase::new(args.model_output_path, source, args.backend).execute()?;

    println!("Training Accuracy: {:.4}", train.accuracy);
    println!("Testing Accuracy: {:.4}", test.accuracy);
    Ok(())
}
