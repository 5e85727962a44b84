// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights and Adam state under the
// estimator's model_dir using a gzip-compressed MessagePack
// recorder at full precision.
//
// File layout:
//   model_dir/
//     model_step_100.mpk.gz   ← weights at global step 100
//     optim_step_100.mpk.gz   ← optimizer moments at step 100
//     model_step_200.mpk.gz
//     optim_step_200.mpk.gz
//     latest_step.json        ← number of the newest step
//     hparams.json            ← hyperparameters the weights belong to
//     eval_metrics.csv        ← written by MetricsLogger
//
// Only the newest `keep_max` steps are kept; a step's optimizer
// file goes together with its weights.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{bail, Context, Result};
use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::HParams;
use crate::ml::model::WordLabelEmbeddingModel;

const WEIGHTS_PREFIX: &str = "model_step_";
const OPTIM_PREFIX: &str = "optim_step_";
const LATEST_FILE: &str = "latest_step.json";
const HPARAMS_FILE: &str = "hparams.json";

type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Manages saving and loading of model checkpoints in one directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir:      PathBuf,
    keep_max: usize,
}

impl CheckpointManager {
    /// Does not touch the filesystem; the directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>, keep_max: usize) -> Self {
        Self { dir: dir.into(), keep_max: keep_max.max(1) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save weights for `step`, advance latest_step.json and prune old files.
    pub fn save_model<B: Backend>(
        &self,
        model: &WordLabelEmbeddingModel<B>,
        step:  usize,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create model_dir '{}'", self.dir.display()))?;

        // Recorder appends the file extension
        let path = self.weights_path(step);
        CheckpointRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let latest_path = self.dir.join(LATEST_FILE);
        fs::write(&latest_path, serde_json::to_string(&step)?)
            .with_context(|| format!("Failed to write '{}'", latest_path.display()))?;

        self.prune()?;
        tracing::debug!("Saved checkpoint for step {}", step);
        Ok(())
    }

    /// Load the newest weights into `model`.
    pub fn load_model<B: Backend>(
        &self,
        model:  WordLabelEmbeddingModel<B>,
        device: &B::Device,
    ) -> Result<(WordLabelEmbeddingModel<B>, usize)> {
        let Some(step) = self.latest_step()? else {
            bail!(
                "No checkpoint found in '{}'. Train the model first.",
                self.dir.display()
            );
        };
        let path = self.weights_path(step);
        tracing::info!("Restoring checkpoint from step {}", step);

        let record = CheckpointRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        Ok((model.load_record(record), step))
    }

    /// Save the optimizer state for `step`. Call before `save_model`
    /// for the same step so pruning sees both files.
    pub fn save_optimizer<B, M, O>(&self, optim: &O, step: usize) -> Result<()>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create model_dir '{}'", self.dir.display()))?;

        let path = self.optim_path(step);
        Recorder::<B>::record(&CheckpointRecorder::new(), optim.to_record(), path.clone())
            .with_context(|| format!("Failed to save optimizer state to '{}'", path.display()))?;
        Ok(())
    }

    /// Whether optimizer state was saved for `step`.
    pub fn has_optimizer(&self, step: usize) -> Result<bool> {
        if !self.dir.exists() {
            return Ok(false);
        }
        let found = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot list '{}'", self.dir.display()))?
            .filter_map(|entry| entry.ok())
            .any(|entry| {
                prefixed_step(&entry.file_name().to_string_lossy(), OPTIM_PREFIX) == Some(step)
            });
        Ok(found)
    }

    /// Load the optimizer state saved for `step` into `optim`.
    pub fn load_optimizer<B, M, O>(&self, optim: O, step: usize, device: &B::Device) -> Result<O>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let path = self.optim_path(step);
        let record: O::Record = Recorder::<B>::load(&CheckpointRecorder::new(), path.clone(), device)
            .with_context(|| format!("Cannot load optimizer state '{}'", path.display()))?;
        tracing::debug!("Restored optimizer state from step {}", step);
        Ok(optim.load_record(record))
    }

    /// The newest saved step, or None when nothing has been saved yet.
    pub fn latest_step(&self) -> Result<Option<usize>> {
        let path = self.dir.join(LATEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        let step = serde_json::from_str::<usize>(s.trim())
            .with_context(|| format!("Corrupt '{}'", path.display()))?;
        Ok(Some(step))
    }

    pub fn save_hparams(&self, params: &HParams) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create model_dir '{}'", self.dir.display()))?;
        let path = self.dir.join(HPARAMS_FILE);
        fs::write(&path, serde_json::to_string_pretty(params)?)
            .with_context(|| format!("Cannot write hparams to '{}'", path.display()))?;
        tracing::debug!("Saved hparams to '{}'", path.display());
        Ok(())
    }

    pub fn load_hparams(&self) -> Result<Option<HParams>> {
        let path = self.dir.join(HPARAMS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read hparams from '{}'", path.display()))?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Write hparams.json if absent, otherwise require that it matches.
    /// Weights can only be restored into a model with the same shapes.
    pub fn ensure_hparams(&self, params: &HParams) -> Result<()> {
        match self.load_hparams()? {
            None => self.save_hparams(params),
            Some(stored) if stored.embedding_size == params.embedding_size
                && stored.dense_units == params.dense_units =>
            {
                if stored.learning_rate != params.learning_rate {
                    tracing::warn!(
                        "learning_rate changed from {} to {} for '{}'",
                        stored.learning_rate,
                        params.learning_rate,
                        self.dir.display()
                    );
                    self.save_hparams(params)?;
                }
                Ok(())
            }
            Some(stored) => bail!(
                "model_dir '{}' holds a model with embedding_size={} dense_units={:?}, \
                 but embedding_size={} dense_units={:?} was requested",
                self.dir.display(),
                stored.embedding_size,
                stored.dense_units,
                params.embedding_size,
                params.dense_units
            ),
        }
    }

    fn weights_path(&self, step: usize) -> PathBuf {
        self.dir.join(format!("{WEIGHTS_PREFIX}{step}"))
    }

    fn optim_path(&self, step: usize) -> PathBuf {
        self.dir.join(format!("{OPTIM_PREFIX}{step}"))
    }

    /// Steps with saved weights, oldest first.
    pub fn saved_steps(&self) -> Result<Vec<usize>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut steps: Vec<usize> = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot list '{}'", self.dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| step_of(&entry.file_name().to_string_lossy()))
            .collect();
        steps.sort_unstable();
        steps.dedup();
        Ok(steps)
    }

    fn prune(&self) -> Result<()> {
        let steps = self.saved_steps()?;
        if steps.len() <= self.keep_max {
            return Ok(());
        }
        let stale = &steps[..steps.len() - self.keep_max];
        for entry in fs::read_dir(&self.dir)?.filter_map(|e| e.ok()) {
            let name = entry.file_name().to_string_lossy().into_owned();
            let step = step_of(&name).or_else(|| prefixed_step(&name, OPTIM_PREFIX));
            if step.is_some_and(|s| stale.contains(&s)) {
                fs::remove_file(entry.path())
                    .with_context(|| format!("Cannot remove old checkpoint '{name}'"))?;
                tracing::debug!("Removed old checkpoint '{}'", name);
            }
        }
        Ok(())
    }
}

/// "model_step_300.mpk.gz" → Some(300)
fn step_of(file_name: &str) -> Option<usize> {
    prefixed_step(file_name, WEIGHTS_PREFIX)
}

fn prefixed_step(file_name: &str, prefix: &str) -> Option<usize> {
    let rest = file_name.strip_prefix(prefix)?;
    rest.split('.').next()?.parse().ok()
}
