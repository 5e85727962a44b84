// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Typed errors for the two places this crate can fail on its
// own terms:
//
//   ConfigError → resolving flags into HParams
//   ModelError  → looking up inputs and checking their shapes
//                 inside the model function
//
// Orchestration code (estimator, checkpoints, CLI) wraps these
// in anyhow::Error with context. Nothing is recovered locally.

use thiserror::Error;

/// Raised by `WordLabelEmbeddingClassifier::hparams`.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("dense_units entry '{token}' in '{raw}' is not an integer")]
    InvalidDenseUnits { raw: String, token: String },

    #[error("dense_units must list at least one layer size")]
    EmptyDenseUnits,

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: String },
}

/// Raised by the model function while wiring inputs into the forward pass.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("feature '{0}' is missing from the feature mapping")]
    MissingFeature(String),

    #[error("label '{0}' is missing from the label mapping")]
    MissingLabel(String),

    #[error("expected embedding size {expected} but input has last dimension {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("invalid batch: {0}")]
    InvalidBatch(String),
}
