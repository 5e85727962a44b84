// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Thin clap front end. It only routes to the config and infra
// layers and prints; training itself is driven through the
// library API with caller-supplied batches.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, HparamsArgs, InspectArgs};

use crate::config::HParams;
use crate::infra::checkpoint::CheckpointManager;

#[derive(Parser, Debug)]
#[command(
    name = "word-label-embedding",
    version,
    about = "Word-label embedding classifier: resolve hyperparameters and inspect model directories."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Hparams(args) => run_hparams(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_hparams(args: HparamsArgs) -> Result<()> {
    let hparams = HParams::from_flags(&args.flags)?;
    println!("{}", serde_json::to_string_pretty(&hparams)?);
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let ckpt = CheckpointManager::new(&args.model_dir, usize::MAX);
    tracing::debug!("Inspecting '{}'", args.model_dir);

    match ckpt.latest_step()? {
        Some(step) => println!("latest_step: {step}"),
        None => println!("latest_step: none"),
    }
    println!("saved_steps: {:?}", ckpt.saved_steps()?);
    match ckpt.load_hparams()? {
        Some(hp) => println!("hparams: {}", serde_json::to_string_pretty(&hp)?),
        None => println!("hparams: none"),
    }
    Ok(())
}
