// ============================================================
// Layer 2 — Hyperparameters
// ============================================================
// HParamFlags is the raw flag surface (three flags, all with
// defaults). HParams is what the model actually consumes.
//
// dense_units is a comma-delimited string on the flag side so
// that a hyperparameter tuner can pass it as a single value;
// it is split and parsed into Vec<usize> here, in order.

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

pub const DEFAULT_LEARNING_RATE: f64 = 0.000003;
pub const DEFAULT_EMBEDDING_SIZE: usize = 100;
pub const DEFAULT_DENSE_UNITS: &str = "128";

/// Hyperparameter flags. Each field becomes a --flag on the command line.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct HParamFlags {
    /// The learning rate to use during training
    #[arg(long, default_value_t = DEFAULT_LEARNING_RATE)]
    pub learning_rate: f64,

    /// The number of dimensions in the word embedding
    #[arg(long, default_value_t = DEFAULT_EMBEDDING_SIZE)]
    pub embedding_size: usize,

    /// Comma delimited string for the number of hidden units in the dense layers
    #[arg(long, default_value = DEFAULT_DENSE_UNITS)]
    pub dense_units: String,
}

impl Default for HParamFlags {
    fn default() -> Self {
        Self {
            learning_rate:  DEFAULT_LEARNING_RATE,
            embedding_size: DEFAULT_EMBEDDING_SIZE,
            dense_units:    DEFAULT_DENSE_UNITS.to_string(),
        }
    }
}

/// Resolved, immutable hyperparameters for one model instance.
/// Serialisable so the estimator can persist them next to its checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HParams {
    pub learning_rate:  f64,
    pub embedding_size: usize,
    pub dense_units:    Vec<usize>,
}

impl HParams {
    /// Validate and build hyperparameters from already-typed values.
    pub fn new(
        learning_rate:  f64,
        embedding_size: usize,
        dense_units:    Vec<usize>,
    ) -> Result<Self, ConfigError> {
        // `!(x > 0.0)` also rejects NaN
        if !(learning_rate > 0.0) {
            return Err(ConfigError::NonPositive {
                name:  "learning_rate",
                value: learning_rate.to_string(),
            });
        }
        if embedding_size == 0 {
            return Err(ConfigError::NonPositive {
                name:  "embedding_size",
                value: "0".to_string(),
            });
        }
        if dense_units.is_empty() {
            return Err(ConfigError::EmptyDenseUnits);
        }
        if dense_units.contains(&0) {
            return Err(ConfigError::NonPositive {
                name:  "dense_units",
                value: "0".to_string(),
            });
        }
        Ok(Self { learning_rate, embedding_size, dense_units })
    }

    /// Resolve flag values into HParams, parsing dense_units.
    pub fn from_flags(flags: &HParamFlags) -> Result<Self, ConfigError> {
        let dense_units = parse_dense_units(&flags.dense_units)?;
        Self::new(flags.learning_rate, flags.embedding_size, dense_units)
    }
}

impl Default for HParams {
    fn default() -> Self {
        Self {
            learning_rate:  DEFAULT_LEARNING_RATE,
            embedding_size: DEFAULT_EMBEDDING_SIZE,
            dense_units:    vec![128],
        }
    }
}

/// Split a comma-delimited string into layer sizes, keeping order.
///
/// "128,64,32" → [128, 64, 32]. Surrounding whitespace on each entry is
/// ignored. An entry that is not an integer is `InvalidDenseUnits`; an
/// integer below 1 is `NonPositive`.
pub fn parse_dense_units(raw: &str) -> Result<Vec<usize>, ConfigError> {
    raw.split(',')
        .map(|token| {
            let token = token.trim();
            let value = token.parse::<i64>().map_err(|_| ConfigError::InvalidDenseUnits {
                raw:   raw.to_string(),
                token: token.to_string(),
            })?;
            usize::try_from(value)
                .ok()
                .filter(|&units| units > 0)
                .ok_or_else(|| ConfigError::NonPositive {
                    name:  "dense_units",
                    value: token.to_string(),
                })
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn flags(dense_units: &str) -> HParamFlags {
        HParamFlags { dense_units: dense_units.to_string(), ..HParamFlags::default() }
    }

    #[test]
    fn test_parses_multiple_dense_units_in_order() {
        let hp = HParams::from_flags(&flags("128,64,32")).unwrap();
        assert_eq!(hp.dense_units, vec![128, 64, 32]);
    }

    #[test]
    fn test_parses_single_dense_unit() {
        let hp = HParams::from_flags(&flags("256")).unwrap();
        assert_eq!(hp.dense_units, vec![256]);
    }

    #[test]
    fn test_rejects_non_integer_dense_units() {
        let err = HParams::from_flags(&flags("a,b")).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidDenseUnits { raw: "a,b".into(), token: "a".into() }
        );
    }

    #[test]
    fn test_negative_and_zero_dense_units_are_non_positive() {
        assert_eq!(
            parse_dense_units("64,-1").unwrap_err(),
            ConfigError::NonPositive { name: "dense_units", value: "-1".into() }
        );
        assert_eq!(
            HParams::from_flags(&flags("0")).unwrap_err(),
            ConfigError::NonPositive { name: "dense_units", value: "0".into() }
        );
    }

    #[test]
    fn test_rejects_trailing_comma() {
        assert!(parse_dense_units("64,").is_err());
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(parse_dense_units(" 64 , 8").unwrap(), vec![64, 8]);
    }

    #[test]
    fn test_defaults_match_flag_defaults() {
        let hp = HParams::from_flags(&HParamFlags::default()).unwrap();
        assert_eq!(hp, HParams::default());
        assert_eq!(hp.learning_rate, 0.000003);
        assert_eq!(hp.embedding_size, 100);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        assert!(HParams::new(0.0, 4, vec![8]).is_err());
        assert!(HParams::new(f64::NAN, 4, vec![8]).is_err());
        assert!(HParams::new(0.1, 0, vec![8]).is_err());
        assert!(HParams::new(0.1, 4, vec![8, 0]).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let hp = HParams::new(0.01, 4, vec![8, 4]).unwrap();
        let json = serde_json::to_string(&hp).unwrap();
        assert_eq!(serde_json::from_str::<HParams>(&json).unwrap(), hp);
    }
}
