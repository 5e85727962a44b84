// ============================================================
// Layer 5 — Estimator
// ============================================================
// train / evaluate / predict around the model function.
//
//   train    → Autodiff backend, Adam step per batch, periodic
//              checkpoints of weights and Adam moments, warm
//              start from the latest one
//   evaluate → inner backend, metrics over all batches,
//              one row appended to eval_metrics.csv
//   predict  → inner backend, one Prediction per example
//
// The estimator owns model_dir. Weights live there between
// calls; nothing is kept in memory across entry points.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    optim::{GradientsParams, Optimizer},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::config::{HParams, RunConfig};
use crate::data::{EmbeddingBatcher, InputBatch};
use crate::domain::mode::Mode;
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::classifier::WordLabelEmbeddingClassifier;
use crate::ml::eval::{EvalMetrics, MetricsAccumulator};
use crate::ml::head::{EstimatorSpec, Prediction};
use crate::ml::model::{WordLabelEmbeddingConfig, WordLabelEmbeddingModel};

#[cfg(not(feature = "wgpu"))]
pub type InferenceBackend = burn::backend::NdArray;
#[cfg(feature = "wgpu")]
pub type InferenceBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferenceBackend>;

pub type Device = <InferenceBackend as Backend>::Device;

type TrainModel = WordLabelEmbeddingModel<TrainBackend>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSummary {
    pub global_step: usize,
    /// Steps run by this call
    pub steps:       usize,
    /// Training loss of the final batch (NaN if no batch ran)
    pub last_loss:   f64,
}

#[derive(Debug, Clone)]
pub struct Estimator {
    classifier:  WordLabelEmbeddingClassifier,
    params:      HParams,
    config:      RunConfig,
    checkpoints: CheckpointManager,
    device:      Device,
}

impl Estimator {
    pub fn new(classifier: WordLabelEmbeddingClassifier, params: HParams, config: RunConfig) -> Self {
        let checkpoints = CheckpointManager::new(config.model_dir(), config.keep_checkpoint_max());
        Self {
            classifier,
            params,
            config,
            checkpoints,
            device: Device::default(),
        }
    }

    /// Replace the run configuration (checkpoint cadence, retention, logging).
    /// The model_dir of the new config is used from here on.
    pub fn with_config(self, config: RunConfig) -> Self {
        Self::new(self.classifier, self.params, config)
    }

    pub fn params(&self) -> &HParams {
        &self.params
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn latest_step(&self) -> Result<Option<usize>> {
        self.checkpoints.latest_step()
    }

    /// Run up to `steps` optimizer steps (all batches when None),
    /// resuming from the latest checkpoint in model_dir if there is one.
    pub fn train<I>(&self, input: I, steps: Option<usize>) -> Result<TrainSummary>
    where
        I: IntoIterator<Item = InputBatch>,
    {
        self.checkpoints.ensure_hparams(&self.params)?;

        let (mut model, start_step) = self.restore_or_init::<TrainBackend>()?;
        let mut optim = self
            .classifier
            .head(&self.params)
            .optimizer()
            .init::<TrainBackend, TrainModel>();
        if start_step > 0 {
            if self.checkpoints.has_optimizer(start_step)? {
                optim = self.checkpoints.load_optimizer::<TrainBackend, TrainModel, _>(
                    optim,
                    start_step,
                    &self.device,
                )?;
            } else {
                tracing::warn!(
                    "No optimizer state for step {}; Adam moments start from zero",
                    start_step
                );
            }
        }
        let batcher = EmbeddingBatcher::<TrainBackend>::new(self.device.clone());

        tracing::info!(
            "Training in '{}' from step {} (lr={}, dense_units={:?})",
            self.config.model_dir().display(),
            start_step,
            self.params.learning_rate,
            self.params.dense_units,
        );

        let mut global_step = start_step;
        let mut last_loss   = f64::NAN;
        let mut last_saved  = start_step;

        for input in input {
            if steps.is_some_and(|max| global_step - start_step >= max) {
                break;
            }

            let batch = batcher.batch(&input);
            let spec = self.classifier.model_fn(
                &model,
                &batch.features,
                batch.labels.as_ref(),
                Mode::Train,
                &self.params,
                &self.config,
            )?;
            let EstimatorSpec::Train { loss, learning_rate, .. } = spec else {
                bail!("model function returned a non-training spec in train mode");
            };

            last_loss = loss.clone().into_scalar().elem::<f64>();
            if last_loss.is_nan() {
                bail!("Model diverged with loss = NaN at step {}", global_step + 1);
            }

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(learning_rate, model, grads);
            global_step += 1;

            if global_step % self.config.log_step_count_steps() == 0 {
                tracing::info!("step {} | loss={:.6}", global_step, last_loss);
            }
            if global_step % self.config.save_checkpoints_steps() == 0 {
                self.save_checkpoint(&model, &optim, global_step)?;
                last_saved = global_step;
            }
        }

        if global_step > last_saved {
            self.save_checkpoint(&model, &optim, global_step)?;
        }

        let summary = TrainSummary {
            global_step,
            steps: global_step - start_step,
            last_loss,
        };
        tracing::info!(
            "Training finished at step {} ({} steps, last loss {:.6})",
            summary.global_step,
            summary.steps,
            summary.last_loss,
        );
        Ok(summary)
    }

    /// Evaluate the latest checkpoint over every batch in `input`.
    pub fn evaluate<I>(&self, input: I) -> Result<EvalMetrics>
    where
        I: IntoIterator<Item = InputBatch>,
    {
        let (model, step) = self.restore::<InferenceBackend>()?;
        let batcher = EmbeddingBatcher::<InferenceBackend>::new(self.device.clone());

        let mut acc = MetricsAccumulator::new();
        for input in input {
            let batch = batcher.batch(&input);
            let spec = self.classifier.model_fn(
                &model,
                &batch.features,
                batch.labels.as_ref(),
                Mode::Evaluate,
                &self.params,
                &self.config,
            )?;
            acc.update(spec)?;
        }

        let metrics = acc.finish(step);
        MetricsLogger::new(self.config.model_dir())?.log(&metrics)?;
        tracing::info!(
            "Eval at step {}: loss={:.4} accuracy={:.4} auc={:.4} ({} examples)",
            metrics.global_step,
            metrics.loss,
            metrics.accuracy,
            metrics.auc,
            metrics.num_examples,
        );
        Ok(metrics)
    }

    /// Score every example with the latest checkpoint. Labels are ignored.
    pub fn predict<I>(&self, input: I) -> Result<Vec<Prediction>>
    where
        I: IntoIterator<Item = InputBatch>,
    {
        let (model, _) = self.restore::<InferenceBackend>()?;
        let batcher = EmbeddingBatcher::<InferenceBackend>::new(self.device.clone());

        let mut predictions = Vec::new();
        for input in input {
            let batch = batcher.batch(&input);
            let spec = self.classifier.model_fn(
                &model,
                &batch.features,
                None,
                Mode::Predict,
                &self.params,
                &self.config,
            )?;
            if let EstimatorSpec::Predict { predictions: p } = spec {
                predictions.extend(p.into_host()?);
            }
        }
        tracing::debug!("Predicted {} examples", predictions.len());
        Ok(predictions)
    }

    fn save_checkpoint<O>(&self, model: &TrainModel, optim: &O, step: usize) -> Result<()>
    where
        O: Optimizer<TrainModel, TrainBackend>,
    {
        self.checkpoints.save_optimizer::<TrainBackend, TrainModel, _>(optim, step)?;
        self.checkpoints.save_model(model, step)
    }

    fn init_model<B: Backend<Device = Device>>(&self) -> WordLabelEmbeddingModel<B> {
        WordLabelEmbeddingConfig::from_hparams(&self.params).init(&self.device)
    }

    fn restore<B: Backend<Device = Device>>(&self) -> Result<(WordLabelEmbeddingModel<B>, usize)> {
        if let Some(stored) = self.checkpoints.load_hparams()? {
            if stored.embedding_size != self.params.embedding_size
                || stored.dense_units != self.params.dense_units
            {
                bail!(
                    "checkpoint in '{}' was trained with embedding_size={} dense_units={:?}",
                    self.config.model_dir().display(),
                    stored.embedding_size,
                    stored.dense_units,
                );
            }
        }
        self.checkpoints.load_model(self.init_model(), &self.device)
    }

    fn restore_or_init<B: Backend<Device = Device>>(&self) -> Result<(WordLabelEmbeddingModel<B>, usize)> {
        match self.checkpoints.latest_step()? {
            Some(_) => self.restore(),
            None => Ok((self.init_model(), 0)),
        }
    }
}
