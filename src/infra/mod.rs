// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything the estimator writes into model_dir:
//
//   checkpoint.rs — model weights, latest_step.json and
//                   hparams.json (so a model can be rebuilt
//                   with the right shapes before loading)
//
//   metrics.rs    — eval_metrics.csv, one row per evaluate()
//
// Reference: Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Evaluation metrics CSV logger
pub mod metrics;
