//! Word-label embedding classifier on burn.
//!
//! A sequence of pre-computed word embeddings is compared against two
//! learned class embeddings by cosine similarity; a short convolution and a
//! softmax turn the similarities into attention over tokens, and the
//! attention-pooled embedding is scored by a dense stack that is shared with
//! the class embeddings themselves.
//!
//! ```no_run
//! use word_label_embedding::{HParamFlags, WordLabelEmbeddingClassifier};
//!
//! # fn main() -> anyhow::Result<()> {
//! let classifier = WordLabelEmbeddingClassifier::new("comment_text", "toxicity")
//!     .with_flags(HParamFlags { dense_units: "128,64".into(), ..Default::default() });
//! let estimator = classifier.estimator("model_dir")?;
//! # let train_batches = Vec::new();
//! estimator.train(train_batches, Some(1000))?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;

pub use config::{HParamFlags, HParams, RunConfig};
pub use data::{EmbeddingSequences, InputBatch};
pub use domain::{
    error::{ConfigError, ModelError},
    mode::Mode,
};
pub use ml::{
    classifier::WordLabelEmbeddingClassifier,
    estimator::{Estimator, TrainSummary},
    eval::EvalMetrics,
    head::Prediction,
    model::{WordLabelEmbeddingConfig, WordLabelEmbeddingModel},
};
