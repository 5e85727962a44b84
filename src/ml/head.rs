// ============================================================
// Layer 5 — Binary Classification Head
// ============================================================
// Turns logits (+ labels + an already-computed per-example
// loss) into what each estimator entry point needs:
//
//   Train    → scalar training loss (mean over the batch)
//   Evaluate → training loss plus everything needed for metrics
//   Predict  → logistic probabilities and class ids
//
// The head never computes a loss of its own. Whatever per-example
// loss the model function hands it is the loss.

use anyhow::{anyhow, Result};
use burn::{optim::AdamConfig, prelude::*, tensor::activation::sigmoid};
use serde::{Deserialize, Serialize};

use crate::domain::{error::ModelError, mode::Mode};

/// Decision threshold on the logistic output
pub const CLASS_THRESHOLD: f64 = 0.5;

/// Adam epsilon used for the training optimizer
pub const ADAM_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone)]
pub struct BinaryClassificationHead {
    name:          String,
    learning_rate: f64,
}

/// Prediction tensors, all with batch as the first dimension.
#[derive(Debug, Clone)]
pub struct PredictionTensors<B: Backend> {
    /// [batch, 1]
    pub logits:        Tensor<B, 2>,
    /// sigmoid(logits), [batch, 1]
    pub logistic:      Tensor<B, 2>,
    /// [1 - p, p], [batch, 2]
    pub probabilities: Tensor<B, 2>,
    /// 1 where p > 0.5, [batch, 1]
    pub class_ids:     Tensor<B, 2, Int>,
}

/// One example's prediction, read back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub logit:         f32,
    pub logistic:      f32,
    pub probabilities: [f32; 2],
    pub class_id:      u8,
}

impl<B: Backend> PredictionTensors<B> {
    /// Copy the batch back to the host, one Prediction per example.
    pub fn into_host(self) -> Result<Vec<Prediction>> {
        let read = |data: burn::tensor::TensorData| {
            data.convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| anyhow!("cannot read predictions: {e:?}"))
        };
        let logits    = read(self.logits.into_data())?;
        let logistic  = read(self.logistic.into_data())?;
        let probs     = read(self.probabilities.into_data())?;
        let class_ids: Vec<i64> = self.class_ids.into_data().iter::<i64>().collect();

        Ok((0..logits.len())
            .map(|i| Prediction {
                logit:         logits[i],
                logistic:      logistic[i],
                probabilities: [probs[2 * i], probs[2 * i + 1]],
                class_id:      u8::from(class_ids[i] != 0),
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub enum EstimatorSpec<B: Backend> {
    Train {
        /// Scalar, shape [1]
        loss:          Tensor<B, 1>,
        predictions:   PredictionTensors<B>,
        learning_rate: f64,
    },
    Evaluate {
        /// Scalar, shape [1]
        loss:             Tensor<B, 1>,
        /// [batch, 1]
        per_example_loss: Tensor<B, 2>,
        predictions:      PredictionTensors<B>,
        /// [batch, 1]
        labels:           Tensor<B, 2>,
    },
    Predict {
        predictions: PredictionTensors<B>,
    },
}

impl<B: Backend> EstimatorSpec<B> {
    pub fn mode(&self) -> Mode {
        match self {
            EstimatorSpec::Train { .. }    => Mode::Train,
            EstimatorSpec::Evaluate { .. } => Mode::Evaluate,
            EstimatorSpec::Predict { .. }  => Mode::Predict,
        }
    }

    pub fn predictions(&self) -> &PredictionTensors<B> {
        match self {
            EstimatorSpec::Train { predictions, .. }
            | EstimatorSpec::Evaluate { predictions, .. }
            | EstimatorSpec::Predict { predictions } => predictions,
        }
    }
}

impl BinaryClassificationHead {
    pub fn new(name: impl Into<String>, learning_rate: f64) -> Self {
        Self { name: name.into(), learning_rate }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// The fixed Adam optimizer applied to the training loss
    pub fn optimizer(&self) -> AdamConfig {
        AdamConfig::new().with_epsilon(ADAM_EPSILON)
    }

    pub fn predictions<B: Backend>(&self, logits: Tensor<B, 2>) -> PredictionTensors<B> {
        let logistic      = sigmoid(logits.clone());
        let probabilities = Tensor::cat(
            vec![logistic.clone().neg().add_scalar(1.0), logistic.clone()],
            1,
        );
        let class_ids = logistic.clone().greater_elem(CLASS_THRESHOLD).int();
        PredictionTensors { logits, logistic, probabilities, class_ids }
    }

    /// `loss` is the per-example loss [batch, 1]; required with `labels`
    /// outside predict mode.
    pub fn create_estimator_spec<B: Backend>(
        &self,
        mode:   Mode,
        logits: Tensor<B, 2>,
        labels: Option<Tensor<B, 2>>,
        loss:   Option<Tensor<B, 2>>,
    ) -> Result<EstimatorSpec<B>, ModelError> {
        let predictions = self.predictions(logits);

        if mode == Mode::Predict {
            return Ok(EstimatorSpec::Predict { predictions });
        }

        let (labels, per_example_loss) = match (labels, loss) {
            (Some(labels), Some(loss)) => (labels, loss),
            _ => return Err(ModelError::MissingLabel(self.name.clone())),
        };
        let training_loss = per_example_loss.clone().mean();

        Ok(match mode {
            Mode::Train => EstimatorSpec::Train {
                loss: training_loss,
                predictions,
                learning_rate: self.learning_rate,
            },
            _ => EstimatorSpec::Evaluate {
                loss: training_loss,
                per_example_loss,
                predictions,
                labels,
            },
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn logits() -> Tensor<TestBackend, 2> {
        Tensor::from_floats([[-2.0], [0.0], [3.0]], &Default::default())
    }

    #[test]
    fn test_predictions() {
        let head = BinaryClassificationHead::new("label", 0.1);
        let p = head.predictions(logits());

        let logistic = p.logistic.into_data().to_vec::<f32>().unwrap();
        assert!((logistic[1] - 0.5).abs() < 1e-6);

        let probs = p.probabilities.into_data().to_vec::<f32>().unwrap();
        for row in probs.chunks(2) {
            assert!((row[0] + row[1] - 1.0).abs() < 1e-6);
        }

        // exactly 0.5 is not above the threshold
        let ids: Vec<i64> = p.class_ids.into_data().iter::<i64>().collect();
        assert_eq!(ids, vec![0, 0, 1]);
    }

    #[test]
    fn test_into_host() {
        let head = BinaryClassificationHead::new("label", 0.1);
        let preds = head.predictions(logits()).into_host().unwrap();
        assert_eq!(preds.len(), 3);
        assert_eq!(preds[0].logit, -2.0);
        assert_eq!(preds[0].class_id, 0);
        assert_eq!(preds[2].class_id, 1);
        assert!((preds[2].probabilities[1] - preds[2].logistic).abs() < 1e-6);
    }

    #[test]
    fn test_train_loss_is_batch_mean() {
        let device = Default::default();
        let head = BinaryClassificationHead::new("label", 0.1);
        let loss = Tensor::<TestBackend, 2>::from_floats([[1.0], [2.0], [6.0]], &device);
        let labels = Tensor::<TestBackend, 2>::zeros([3, 1], &device);

        let spec = head
            .create_estimator_spec(Mode::Train, logits(), Some(labels), Some(loss))
            .unwrap();
        assert_eq!(spec.mode(), Mode::Train);
        match spec {
            EstimatorSpec::Train { loss, learning_rate, .. } => {
                assert_eq!(loss.into_scalar(), 3.0);
                assert_eq!(learning_rate, 0.1);
            }
            other => panic!("unexpected spec for {}", other.mode()),
        }
    }

    #[test]
    fn test_predict_needs_no_labels() {
        let head = BinaryClassificationHead::new("label", 0.1);
        let spec = head
            .create_estimator_spec::<TestBackend>(Mode::Predict, logits(), None, None)
            .unwrap();
        assert_eq!(spec.mode(), Mode::Predict);
        assert_eq!(spec.predictions().probabilities.dims(), [3, 2]);
    }

    #[test]
    fn test_evaluate_without_labels_fails() {
        let head = BinaryClassificationHead::new("toxicity", 0.1);
        let err = head
            .create_estimator_spec::<TestBackend>(Mode::Evaluate, logits(), None, None)
            .unwrap_err();
        assert_eq!(err, ModelError::MissingLabel("toxicity".into()));
    }
}
