// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Two subcommands:
//
//   hparams — resolve the hyperparameter flags and print them
//   inspect — show what a model_dir currently holds

use clap::{Args, Subcommand};

use crate::config::HParamFlags;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve hyperparameter flags and print them as JSON
    Hparams(HparamsArgs),

    /// Print the latest checkpoint step and stored hparams of a model_dir
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct HparamsArgs {
    #[command(flatten)]
    pub flags: HParamFlags,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Directory the estimator keeps its checkpoints in
    #[arg(long)]
    pub model_dir: String,
}
