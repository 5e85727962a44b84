// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All burn-specific code lives here.
//
//   ops.rs        — l2 normalisation, sigmoid cross-entropy
//   dense.rs      — the shared dense stack
//   model.rs      — class embeddings, similarity conv, forward pass
//   head.rs       — binary classification head, EstimatorSpec
//   eval.rs       — evaluation metric accumulation
//   classifier.rs — public model definition and model function
//   estimator.rs  — train / evaluate / predict with checkpoints
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Numeric helpers over burn tensors
pub mod ops;

/// Dense layers shared by the example and anchor paths
pub mod dense;

/// The word-label embedding module and its forward pass
pub mod model;

/// Binary classification head and per-mode outputs
pub mod head;

/// Evaluation metrics
pub mod eval;

/// Model definition bound to feature/label names
pub mod classifier;

/// Training loop, evaluation and prediction over checkpoints
pub mod estimator;
