// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// `clap` and hands the work to Layer 2 (application).
//
//   1. `train`    - fine-tunes the model on the tag corpus
//   2. `describe` - loads the trained model and describes tags
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, DescribeArgs, TrainArgs};

use crate::application::{
    describe_use_case::DescribeUseCase,
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "tag-describer",
    version,
    about = "Train a tags → description model, then describe new tag sets."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the matching use case; nothing is computed here.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Describe(args) => run_describe(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    match &args.corpus {
        Some(path) => tracing::info!("Starting training on corpus '{}'", path),
        None       => tracing::info!("Starting training on the bundled corpus"),
    }
    let checkpoint_dir = args.checkpoint_dir.clone();

    let summary = TrainUseCase::new(args.into()).execute()?;

    if let Some(last) = summary.history.last() {
        tracing::info!("Final epoch: train_loss={:.4}, val_loss={:.4}", last.train_loss, last.val_loss);
    }
    println!("Training complete. Artifacts saved to '{}'.", checkpoint_dir);
    if let Some(sample) = summary.sample {
        println!("{sample}");
    }
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<()> {
    let use_case = DescribeUseCase::from_checkpoint(args.checkpoint_dir)?;
    let output   = use_case.describe(&args.input_tags)?;
    println!("{output}");
    Ok(())
}
