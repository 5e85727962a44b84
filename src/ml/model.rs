// ============================================================
// Layer 5 — Word Label Embedding Model
// ============================================================
// Scores a sequence of word embeddings against two learned
// class embeddings:
//
//   word_emb_seq [b, s, e]      class_embs [2, e]
//        │ l2-normalise              │ l2-normalise
//        └──────── matmul ───────────┘
//                    │  cosine        [b, s, 2]
//                    ▼
//          conv [5×1], same, ReLU     [b, s, 2]
//                    │  max over classes
//                    ▼
//          softmax over s             [b, s]   ← attention
//                    │
//   Σ_s attention · word_emb_seq      [b, e]   (raw, not normalised)
//                    │
//              DenseStack             [b, 1]   ← logits
//
// class_embs[0] and class_embs[1] also go through the same
// DenseStack; their logits feed the two anchor terms of the loss.
//
// Reference: Burn Book §3 (Building Blocks)

use burn::{
    module::Param,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        Initializer, PaddingConfig2d,
    },
    prelude::*,
    tensor::{
        activation::{relu, softmax},
        Distribution,
    },
};

use crate::config::HParams;
use crate::ml::dense::{DenseStack, DenseStackConfig};
use crate::ml::ops::{l2_normalize, sigmoid_cross_entropy_with_logits};

/// Number of learned class embeddings (negative, positive)
pub const NUM_CLASSES: usize = 2;

/// Window of the similarity convolution along the sequence axis
pub const SIMILARITY_KERNEL: usize = 5;

#[derive(Config, Debug)]
pub struct WordLabelEmbeddingConfig {
    pub embedding_size: usize,
    pub dense_units:    Vec<usize>,
}

impl WordLabelEmbeddingConfig {
    pub fn from_hparams(hparams: &HParams) -> Self {
        Self::new(hparams.embedding_size, hparams.dense_units.clone())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> WordLabelEmbeddingModel<B> {
        let class_embs = Tensor::<B, 2>::random(
            [NUM_CLASSES, self.embedding_size],
            Distribution::Normal(0.0, 1.0),
            device,
        );

        // One in/out channel; the kernel spans 5 tokens and a single
        // class column, so each column is smoothed independently.
        let similarity_conv = Conv2dConfig::new([1, 1], [SIMILARITY_KERNEL, 1])
            .with_padding(PaddingConfig2d::Same)
            .with_initializer(Initializer::XavierUniform { gain: 1.0 })
            .init(device);

        let dense = DenseStackConfig::new(self.embedding_size, self.dense_units.clone())
            .init(device);

        WordLabelEmbeddingModel {
            class_embs: Param::from_tensor(class_embs),
            similarity_conv,
            dense,
            embedding_size: self.embedding_size,
        }
    }
}

#[derive(Module, Debug)]
pub struct WordLabelEmbeddingModel<B: Backend> {
    /// Row 0 = negative class, row 1 = positive class. Shape [2, embedding_size]
    pub class_embs:      Param<Tensor<B, 2>>,
    pub similarity_conv: Conv2d<B>,
    pub dense:           DenseStack<B>,
    pub embedding_size:  usize,
}

pub struct WordLabelOutput<B: Backend> {
    /// [batch, 1]
    pub logits:            Tensor<B, 2>,
    /// [batch, seq_len], each row sums to 1
    pub attention:         Tensor<B, 2>,
    /// [batch, embedding_size]
    pub weighted_word_emb: Tensor<B, 2>,
    /// [1, 1]
    pub class_zero_logits: Tensor<B, 2>,
    /// [1, 1]
    pub class_one_logits:  Tensor<B, 2>,
}

impl<B: Backend> WordLabelEmbeddingModel<B> {
    /// word_emb_seq: [batch, seq_len, embedding_size]
    ///
    /// The caller is responsible for checking the last dimension
    /// against `embedding_size`; a mismatch panics inside matmul.
    pub fn forward(&self, word_emb_seq: Tensor<B, 3>) -> WordLabelOutput<B> {
        let [batch_size, seq_len, emb_size] = word_emb_seq.dims();
        let class_embs = self.class_embs.val();

        let word_emb_norm  = l2_normalize(word_emb_seq.clone());
        let class_embs_norm = l2_normalize(class_embs.clone());

        // [b, s, e] @ [b, e, 2] → [b, s, 2]
        let class_embs_t = class_embs_norm
            .transpose()
            .unsqueeze::<3>()
            .repeat_dim(0, batch_size);
        let cosine = word_emb_norm.matmul(class_embs_t);

        // NCHW with a single channel: [b, 1, s, 2]
        let cosine = self.similarity_conv.forward(cosine.unsqueeze_dim::<4>(1));
        let cosine = relu(cosine).reshape([batch_size, seq_len, NUM_CLASSES]);

        let max_cosine = cosine.max_dim(2).reshape([batch_size, seq_len]);
        let attention  = softmax(max_cosine, 1);

        let weighted_word_emb = (word_emb_seq * attention.clone().unsqueeze_dim::<3>(2))
            .sum_dim(1)
            .reshape([batch_size, emb_size]);

        let logits = self.dense.forward(weighted_word_emb.clone());

        let class_zero_logits = self
            .dense
            .forward(class_embs.clone().slice([0..1, 0..self.embedding_size]));
        let class_one_logits = self
            .dense
            .forward(class_embs.slice([1..2, 0..self.embedding_size]));

        WordLabelOutput {
            logits,
            attention,
            weighted_word_emb,
            class_zero_logits,
            class_one_logits,
        }
    }

    /// Per-example loss, shape [batch, 1]:
    ///
    ///   SCE(labels, logits) + SCE(0, class_zero_logit) + SCE(1, class_one_logit)
    ///
    /// The two anchor terms are identical for every row of the batch.
    pub fn forward_loss(
        &self,
        word_emb_seq: Tensor<B, 3>,
        labels:       Tensor<B, 2>,
    ) -> (Tensor<B, 2>, WordLabelOutput<B>) {
        let output = self.forward(word_emb_seq);
        let loss   = self.loss(&output, labels);
        (loss, output)
    }

    pub fn loss(&self, output: &WordLabelOutput<B>, labels: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = output.logits.device();

        let example_loss = sigmoid_cross_entropy_with_logits(labels, output.logits.clone());
        let class_zero_reg = sigmoid_cross_entropy_with_logits(
            Tensor::zeros([1, 1], &device),
            output.class_zero_logits.clone(),
        );
        let class_one_reg = sigmoid_cross_entropy_with_logits(
            Tensor::ones([1, 1], &device),
            output.class_one_logits.clone(),
        );

        example_loss + class_zero_reg + class_one_reg
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray;

    const TOLERANCE: f32 = 1e-5;

    fn to_vec<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    fn model(embedding_size: usize, dense_units: Vec<usize>) -> WordLabelEmbeddingModel<TestBackend> {
        WordLabelEmbeddingConfig::new(embedding_size, dense_units).init(&Default::default())
    }

    /// Replace the learned conv with a pass-through (centre tap 1, bias 0)
    /// and pin the class embeddings, so attention can be computed by hand.
    fn transparent_model(class_embs: [[f32; 4]; 2]) -> WordLabelEmbeddingModel<TestBackend> {
        let device = Default::default();
        let mut m = model(4, vec![3]);
        m.class_embs = Param::from_tensor(Tensor::from_floats(class_embs, &device));
        m.similarity_conv.weight = Param::from_tensor(Tensor::from_data(
            TensorData::new(vec![0.0f32, 0.0, 1.0, 0.0, 0.0], [1, 1, SIMILARITY_KERNEL, 1]),
            &device,
        ));
        m.similarity_conv.bias = Some(Param::from_tensor(Tensor::zeros([1], &device)));
        m
    }

    fn sequence(tokens: &[[f32; 4]]) -> Tensor<TestBackend, 3> {
        let flat: Vec<f32> = tokens.iter().flatten().copied().collect();
        Tensor::from_data(TensorData::new(flat, [1, tokens.len(), 4]), &Default::default())
    }

    fn sce(label: f64, logit: f64) -> f64 {
        logit.max(0.0) - logit * label + (-logit.abs()).exp().ln_1p()
    }

    #[test]
    fn test_output_shapes_and_attention_sums_to_one() {
        let device = Default::default();
        for (emb, seq) in [(4, 1), (4, 3), (7, 9), (16, 2)] {
            let m = model(emb, vec![5, 3]);
            let x = Tensor::<TestBackend, 3>::random([3, seq, emb], Distribution::Normal(0.0, 1.0), &device);
            let out = m.forward(x);

            assert_eq!(out.logits.dims(), [3, 1]);
            assert_eq!(out.attention.dims(), [3, seq]);
            assert_eq!(out.weighted_word_emb.dims(), [3, emb]);
            assert_eq!(out.class_zero_logits.dims(), [1, 1]);
            assert_eq!(out.class_one_logits.dims(), [1, 1]);

            for row in to_vec(out.attention.sum_dim(1)) {
                assert!((row - 1.0).abs() < TOLERANCE, "attention row sums to {row}");
            }
        }
    }

    #[test]
    fn test_dense_stack_is_shared_across_all_three_paths() {
        let device = Default::default();
        let m = model(4, vec![6, 3]);
        let x = Tensor::<TestBackend, 3>::random([2, 5, 4], Distribution::Normal(0.0, 1.0), &device);
        let before = m.forward(x.clone());

        // Shift the output bias of the single shared stack by +1
        let mut bumped = m.clone();
        let bias = bumped.dense.output.bias.take().expect("dense output has a bias");
        bumped.dense.output.bias = Some(Param::from_tensor(bias.val().add_scalar(1.0)));
        let after = bumped.forward(x);

        let pairs = [
            (before.logits, after.logits),
            (before.class_zero_logits, after.class_zero_logits),
            (before.class_one_logits, after.class_one_logits),
        ];
        for (b, a) in pairs {
            for (vb, va) in to_vec(b).into_iter().zip(to_vec(a)) {
                assert!((va - vb - 1.0).abs() < TOLERANCE, "{vb} → {va}");
            }
        }
    }

    #[test]
    fn test_hand_computed_attention_and_loss() {
        let m = transparent_model([[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]]);

        // cosines vs (class0, class1):
        //   t0 = (1, 0), t1 = (0, 0.6), t2 = (1/√2, 0)
        let x = sequence(&[[2.0, 0.0, 0.0, 0.0], [0.0, 3.0, 0.0, 4.0], [1.0, 0.0, 1.0, 0.0]]);
        let labels = Tensor::<TestBackend, 2>::from_floats([[1.0]], &Default::default());
        let (loss, out) = m.forward_loss(x, labels);

        let scores = [1.0f64, 0.6, std::f64::consts::FRAC_1_SQRT_2];
        let denom: f64 = scores.iter().map(|s| s.exp()).sum();
        let attention = to_vec(out.attention.clone());
        for (i, s) in scores.iter().enumerate() {
            let expected = s.exp() / denom;
            assert!((attention[i] as f64 - expected).abs() < 1e-5, "token {i}");
        }

        // weighted embedding uses the raw (unnormalised) tokens
        let weighted = to_vec(out.weighted_word_emb.clone());
        let a: Vec<f64> = attention.iter().map(|v| *v as f64).collect();
        let expected = [2.0 * a[0] + a[2], 3.0 * a[1], a[2], 4.0 * a[1]];
        for (w, e) in weighted.iter().zip(expected) {
            assert!((*w as f64 - e).abs() < 1e-5);
        }

        let logit = to_vec(out.logits)[0] as f64;
        let c0    = to_vec(out.class_zero_logits)[0] as f64;
        let c1    = to_vec(out.class_one_logits)[0] as f64;
        let expected_loss = sce(1.0, logit) + sce(0.0, c0) + sce(1.0, c1);
        let loss = to_vec(loss);
        assert_eq!(loss.len(), 1);
        assert!((loss[0] as f64 - expected_loss).abs() < 1e-5);
    }

    #[test]
    fn test_anchor_terms_added_to_every_example() {
        let device = Default::default();
        let m = model(4, vec![3]);
        let x = Tensor::<TestBackend, 3>::random([3, 4, 4], Distribution::Normal(0.0, 1.0), &device);
        let labels = Tensor::<TestBackend, 2>::from_floats([[0.0], [1.0], [1.0]], &device);
        let (loss, out) = m.forward_loss(x, labels);

        let c0 = to_vec(out.class_zero_logits)[0] as f64;
        let c1 = to_vec(out.class_one_logits)[0] as f64;
        let anchors = sce(0.0, c0) + sce(1.0, c1);
        let logits = to_vec(out.logits);
        let loss = to_vec(loss);
        assert_eq!(loss.len(), 3);
        for (i, label) in [0.0, 1.0, 1.0].into_iter().enumerate() {
            let expected = sce(label, logits[i] as f64) + anchors;
            assert!((loss[i] as f64 - expected).abs() < 1e-5, "example {i}");
        }
    }

    #[test]
    fn test_attention_monotone_in_correct_class_similarity() {
        let m = transparent_model([[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]]);

        let mut previous = 0.0f32;
        for strength in [0.2f32, 0.5, 1.0, 2.0, 5.0] {
            // Only token 1 changes, turning towards the positive class
            let x = sequence(&[
                [1.0, 0.0, 1.0, 0.0],
                [0.0, strength, 1.0, 0.0],
                [0.0, 0.0, 1.0, 1.0],
            ]);
            let weight = to_vec(m.forward(x).attention)[1];
            assert!(weight >= previous - TOLERANCE, "{weight} < {previous} at {strength}");
            previous = weight;
        }
    }

    #[test]
    fn test_class_embeddings_initialised_with_expected_shape() {
        let m = model(12, vec![4]);
        assert_eq!(m.class_embs.val().dims(), [NUM_CLASSES, 12]);
        assert_eq!(m.similarity_conv.weight.val().dims(), [1, 1, SIMILARITY_KERNEL, 1]);
    }
}
