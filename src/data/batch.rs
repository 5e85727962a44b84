// ============================================================
// Layer 4 — Input Batch
// ============================================================
// A batch of examples as plain Vec<f32> buffers keyed by name,
// mirroring the feature/label mappings the model function
// receives. Word embeddings are stored row-major as
// [batch, seq_len, embedding_size].

use std::collections::HashMap;

use crate::domain::error::ModelError;

/// A dense (batch, seq_len, embedding_size) block of word embeddings.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingSequences {
    values:         Vec<f32>,
    batch_size:     usize,
    seq_len:        usize,
    embedding_size: usize,
}

impl EmbeddingSequences {
    /// Wrap a flat row-major buffer. The buffer length must match the shape.
    pub fn new(
        values:         Vec<f32>,
        batch_size:     usize,
        seq_len:        usize,
        embedding_size: usize,
    ) -> Result<Self, ModelError> {
        let expected = batch_size * seq_len * embedding_size;
        if batch_size == 0 || seq_len == 0 || embedding_size == 0 {
            return Err(ModelError::InvalidBatch(format!(
                "empty shape [{batch_size}, {seq_len}, {embedding_size}]"
            )));
        }
        if values.len() != expected {
            return Err(ModelError::InvalidBatch(format!(
                "buffer has {} values, shape [{batch_size}, {seq_len}, {embedding_size}] needs {expected}",
                values.len()
            )));
        }
        Ok(Self { values, batch_size, seq_len, embedding_size })
    }

    /// Build from one Vec of token vectors per example.
    /// Every example must have the same length and every token the same width.
    pub fn from_examples(examples: &[Vec<Vec<f32>>]) -> Result<Self, ModelError> {
        let batch_size     = examples.len();
        let seq_len        = examples.first().map_or(0, Vec::len);
        let embedding_size = examples
            .first()
            .and_then(|e| e.first())
            .map_or(0, Vec::len);

        let mut values = Vec::with_capacity(batch_size * seq_len * embedding_size);
        for (i, example) in examples.iter().enumerate() {
            if example.len() != seq_len {
                return Err(ModelError::InvalidBatch(format!(
                    "example {i} has {} tokens, expected {seq_len}",
                    example.len()
                )));
            }
            for token in example {
                if token.len() != embedding_size {
                    return Err(ModelError::InvalidBatch(format!(
                        "example {i} has a token of width {}, expected {embedding_size}",
                        token.len()
                    )));
                }
                values.extend_from_slice(token);
            }
        }
        Self::new(values, batch_size, seq_len, embedding_size)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.batch_size, self.seq_len, self.embedding_size]
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Named features and (optionally) named labels for one batch.
/// Labels are `None` for pure inference input.
#[derive(Debug, Clone, Default)]
pub struct InputBatch {
    pub features: HashMap<String, EmbeddingSequences>,
    pub labels:   Option<HashMap<String, Vec<f32>>>,
}

impl InputBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feature(mut self, name: impl Into<String>, seqs: EmbeddingSequences) -> Self {
        self.features.insert(name.into(), seqs);
        self
    }

    /// Add a per-example 0/1 label vector under `name`.
    pub fn with_label(mut self, name: impl Into<String>, labels: Vec<f32>) -> Self {
        self.labels
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), labels);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_examples_flattens_row_major() {
        let seqs = EmbeddingSequences::from_examples(&[
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            vec![vec![5.0, 6.0], vec![7.0, 8.0]],
        ])
        .unwrap();
        assert_eq!(seqs.shape(), [2, 2, 2]);
        assert_eq!(seqs.values(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_ragged_examples_are_rejected() {
        let err = EmbeddingSequences::from_examples(&[
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            vec![vec![5.0, 6.0]],
        ])
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidBatch(_)));
    }

    #[test]
    fn test_buffer_length_must_match_shape() {
        assert!(EmbeddingSequences::new(vec![0.0; 5], 1, 2, 3).is_err());
        assert!(EmbeddingSequences::new(vec![], 0, 2, 3).is_err());
    }

    #[test]
    fn test_with_label_creates_mapping() {
        let batch = InputBatch::new();
        assert!(batch.labels.is_none());
        let batch = batch.with_label("toxic", vec![1.0]);
        assert_eq!(batch.labels.unwrap()["toxic"], vec![1.0]);
    }
}
