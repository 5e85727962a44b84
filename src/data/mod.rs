// ============================================================
// Layer 4 — Data
// ============================================================
// The model never reads files. Callers hand the estimator
// already-embedded examples as host buffers, and this layer
// turns them into burn tensors on the right device:
//
//   InputBatch        → named host buffers (features + labels)
//       │
//       ▼
//   EmbeddingBatcher  → validates shapes, builds tensors
//       │
//       ▼
//   TensorBatch<B>    → FeatureMap<B> + Option<LabelMap<B>>
//
// Reference: Burn Book §4 (Batcher)

/// Host-side named feature and label buffers
pub mod batch;

/// Converts an InputBatch into device tensors
pub mod batcher;

pub use batch::{EmbeddingSequences, InputBatch};
pub use batcher::{EmbeddingBatcher, FeatureMap, LabelMap, TensorBatch};
