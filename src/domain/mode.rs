// ============================================================
// Layer 3 — Mode
// ============================================================
// Which of the three estimator entry points is invoking the
// model function. The model function branches on this:
//
//   Train    → labels required, loss + optimizer step
//   Evaluate → labels required, loss + metrics
//   Predict  → labels ignored, probabilities only

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Train,
    Evaluate,
    Predict,
}

impl Mode {
    /// True for the modes that compute a loss and therefore need labels
    pub fn needs_labels(self) -> bool {
        !matches!(self, Mode::Predict)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Train    => "train",
            Mode::Evaluate => "evaluate",
            Mode::Predict  => "predict",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_predict_skips_labels() {
        assert!(Mode::Train.needs_labels());
        assert!(Mode::Evaluate.needs_labels());
        assert!(!Mode::Predict.needs_labels());
    }

    #[test]
    fn test_display_matches_serde_name() {
        let json = serde_json::to_string(&Mode::Evaluate).unwrap();
        assert_eq!(json, format!("\"{}\"", Mode::Evaluate));
    }
}
