// ============================================================
// Layer 2 — Configuration
// ============================================================
// Everything the model and estimator are parameterised by:
//
//   hparams.rs    — hyperparameter flags (clap) and the
//                   immutable HParams resolved from them
//   run_config.rs — where and how often the estimator
//                   writes checkpoints and logs
//
// Nothing here is process-global. Each model instance gets
// its own HParams value, so several configurations can live
// side by side in one process (and one test binary).

/// Hyperparameter flags and the resolved HParams struct
pub mod hparams;

/// Estimator run configuration (model_dir, checkpoint cadence)
pub mod run_config;

pub use hparams::{HParamFlags, HParams};
pub use run_config::RunConfig;
