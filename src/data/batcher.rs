// ============================================================
// Layer 4 — Embedding Batcher
// ============================================================
// Converts an InputBatch into burn tensors on a given device.
//
//   features[name] : [batch, seq_len, embedding_size]  (Float)
//   labels[name]   : [batch, 1]                        (Float, 0/1)
//
// Labels are kept as floats in a trailing unit dimension so
// they line up element-wise with the [batch, 1] logits in the
// sigmoid cross-entropy.
//
// Reference: Burn Book §4 (Batcher)

use std::collections::HashMap;

use burn::{prelude::*, tensor::TensorData};

use crate::data::batch::InputBatch;

/// Named word-embedding tensors, shape [batch, seq_len, embedding_size]
pub type FeatureMap<B> = HashMap<String, Tensor<B, 3>>;

/// Named label tensors, shape [batch, 1]
pub type LabelMap<B> = HashMap<String, Tensor<B, 2>>;

/// One batch on the device, ready for the model function.
#[derive(Debug, Clone)]
pub struct TensorBatch<B: Backend> {
    pub features: FeatureMap<B>,
    pub labels:   Option<LabelMap<B>>,
}

/// Holds the target device so tensors are created on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct EmbeddingBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> EmbeddingBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn batch(&self, input: &InputBatch) -> TensorBatch<B> {
        let features = input
            .features
            .iter()
            .map(|(name, seqs)| {
                let data   = TensorData::new(seqs.values().to_vec(), seqs.shape());
                let tensor = Tensor::<B, 3>::from_data(data, &self.device);
                (name.clone(), tensor)
            })
            .collect();

        let labels = input.labels.as_ref().map(|labels| {
            labels
                .iter()
                .map(|(name, values)| {
                    let data   = TensorData::new(values.clone(), [values.len(), 1]);
                    let tensor = Tensor::<B, 2>::from_data(data, &self.device);
                    (name.clone(), tensor)
                })
                .collect()
        });

        TensorBatch { features, labels }
    }
}
