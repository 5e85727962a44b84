// ============================================================
// Layer 5 — Word Label Embedding Classifier
// ============================================================
// The public model definition. It binds:
//
//   text_feature_name → which feature holds the embedding sequence
//   target_label      → which label holds the 0/1 target
//   HParamFlags       → resolved into HParams on demand
//
// and exposes the per-step model function that the Estimator
// calls in every mode. Nothing is computed at construction;
// unknown feature/label names only fail when model_fn runs.

use burn::prelude::*;

use crate::config::{HParamFlags, HParams, RunConfig};
use crate::data::{FeatureMap, LabelMap};
use crate::domain::{
    error::{ConfigError, ModelError},
    mode::Mode,
};
use crate::ml::estimator::Estimator;
use crate::ml::head::{BinaryClassificationHead, EstimatorSpec};
use crate::ml::model::WordLabelEmbeddingModel;

#[derive(Debug, Clone, PartialEq)]
pub struct WordLabelEmbeddingClassifier {
    text_feature_name: String,
    target_label:      String,
    flags:             HParamFlags,
}

impl WordLabelEmbeddingClassifier {
    pub fn new(text_feature_name: impl Into<String>, target_label: impl Into<String>) -> Self {
        Self {
            text_feature_name: text_feature_name.into(),
            target_label:      target_label.into(),
            flags:             HParamFlags::default(),
        }
    }

    /// Use these flag values instead of the defaults.
    pub fn with_flags(mut self, flags: HParamFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn text_feature_name(&self) -> &str {
        &self.text_feature_name
    }

    pub fn target_label(&self) -> &str {
        &self.target_label
    }

    /// Resolve the bound flags into immutable hyperparameters.
    pub fn hparams(&self) -> Result<HParams, ConfigError> {
        HParams::from_flags(&self.flags)
    }

    /// Build an estimator that keeps its checkpoints in `model_dir`.
    /// Only records the path; nothing is written until training saves.
    pub fn estimator(&self, model_dir: impl Into<std::path::PathBuf>) -> Result<Estimator, ConfigError> {
        let params = self.hparams()?;
        Ok(Estimator::new(self.clone(), params, RunConfig::new(model_dir)))
    }

    pub fn head(&self, params: &HParams) -> BinaryClassificationHead {
        BinaryClassificationHead::new(self.target_label.clone(), params.learning_rate)
    }

    /// Per-step model function.
    ///
    /// Labels are looked up only in train/evaluate mode; in predict mode
    /// they are ignored and no loss is built.
    pub fn model_fn<B: Backend>(
        &self,
        model:    &WordLabelEmbeddingModel<B>,
        features: &FeatureMap<B>,
        labels:   Option<&LabelMap<B>>,
        mode:     Mode,
        params:   &HParams,
        _config:  &RunConfig,
    ) -> Result<EstimatorSpec<B>, ModelError> {
        let word_emb_seq = features
            .get(&self.text_feature_name)
            .cloned()
            .ok_or_else(|| ModelError::MissingFeature(self.text_feature_name.clone()))?;

        let [batch_size, _, emb_size] = word_emb_seq.dims();
        if emb_size != params.embedding_size || emb_size != model.embedding_size {
            return Err(ModelError::ShapeMismatch {
                expected: params.embedding_size,
                actual:   emb_size,
            });
        }

        let labels = if mode.needs_labels() {
            let labels = labels
                .and_then(|l| l.get(&self.target_label))
                .cloned()
                .ok_or_else(|| ModelError::MissingLabel(self.target_label.clone()))?;
            let [label_rows, _] = labels.dims();
            if label_rows != batch_size {
                return Err(ModelError::InvalidBatch(format!(
                    "{label_rows} labels for {batch_size} examples"
                )));
            }
            Some(labels)
        } else {
            None
        };

        let output = model.forward(word_emb_seq);
        let loss   = labels.clone().map(|labels| model.loss(&output, labels));

        self.head(params)
            .create_estimator_spec(mode, output.logits, labels, loss)
    }
}
