// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// Where the estimator keeps its state and how often it
// touches disk. Building a RunConfig only records the path;
// the directory is created on the first checkpoint save.

use std::path::{Path, PathBuf};

pub const DEFAULT_SAVE_CHECKPOINTS_STEPS: usize = 100;
pub const DEFAULT_KEEP_CHECKPOINT_MAX: usize = 5;
pub const DEFAULT_LOG_STEP_COUNT_STEPS: usize = 100;

/// Fields are only set through the builders, which keep every
/// step cadence at 1 or more.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Directory holding checkpoints, hparams.json and eval_metrics.csv
    model_dir: PathBuf,

    /// Save a checkpoint every N global steps (and always at the end of train)
    save_checkpoints_steps: usize,

    /// Number of most recent checkpoints to keep on disk
    keep_checkpoint_max: usize,

    /// Emit a progress log line every N global steps
    log_step_count_steps: usize,
}

impl RunConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir:              model_dir.into(),
            save_checkpoints_steps: DEFAULT_SAVE_CHECKPOINTS_STEPS,
            keep_checkpoint_max:    DEFAULT_KEEP_CHECKPOINT_MAX,
            log_step_count_steps:   DEFAULT_LOG_STEP_COUNT_STEPS,
        }
    }

    pub fn with_save_checkpoints_steps(mut self, steps: usize) -> Self {
        self.save_checkpoints_steps = steps.max(1);
        self
    }

    pub fn with_keep_checkpoint_max(mut self, max: usize) -> Self {
        self.keep_checkpoint_max = max.max(1);
        self
    }

    pub fn with_log_step_count_steps(mut self, steps: usize) -> Self {
        self.log_step_count_steps = steps.max(1);
        self
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn save_checkpoints_steps(&self) -> usize {
        self.save_checkpoints_steps
    }

    pub fn keep_checkpoint_max(&self) -> usize {
        self.keep_checkpoint_max
    }

    pub fn log_step_count_steps(&self) -> usize {
        self.log_step_count_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_does_not_touch_disk() {
        let dir = std::env::temp_dir().join("wle-run-config-never-created");
        let cfg = RunConfig::new(&dir);
        assert_eq!(cfg.model_dir(), dir.as_path());
        assert!(!dir.exists());
    }

    #[test]
    fn test_builders_clamp_to_one() {
        let cfg = RunConfig::new("m")
            .with_save_checkpoints_steps(0)
            .with_keep_checkpoint_max(0)
            .with_log_step_count_steps(10);
        assert_eq!(cfg.save_checkpoints_steps(), 1);
        assert_eq!(cfg.keep_checkpoint_max(), 1);
        assert_eq!(cfg.log_step_count_steps(), 10);
    }
}
