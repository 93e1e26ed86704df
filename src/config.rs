//! Runtime configuration, sourced from environment variables.

use crate::application::forest::ForestParams;
use crate::application::indicators::IndicatorParams;
use crate::domain::ports::Period;
use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Version tag stamped into artifact metadata at training time.
pub const MODEL_VERSION: &str = "1.0.0";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding persisted model artifacts.
    pub models_dir: PathBuf,
    /// Rows per model input window.
    pub sequence_length: usize,
    /// Horizon in trading days between a window's end and its target.
    pub prediction_days: usize,
    /// Chronological train fraction, strictly inside (0, 1).
    pub train_test_split: f64,
    /// History requested for training runs.
    pub train_period: Period,
    /// Recent history requested for inference.
    pub predict_lookback: Period,
    pub indicators: IndicatorParams,
    pub forest: ForestParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            sequence_length: 60,
            prediction_days: 1,
            train_test_split: 0.8,
            train_period: Period::TwoYears,
            predict_lookback: Period::ThreeMonths,
            indicators: IndicatorParams::default(),
            forest: ForestParams::default(),
        }
    }
}

impl Config {
    /// Loads from `STOCKCAST_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let mut forest = ForestParams::default();
        forest.n_trees = parse_env("STOCKCAST_FOREST_N_TREES", forest.n_trees)?;
        forest.max_depth = parse_env("STOCKCAST_FOREST_MAX_DEPTH", forest.max_depth)?;
        forest.min_samples_split =
            parse_env("STOCKCAST_FOREST_MIN_SPLIT", forest.min_samples_split)?;

        let config = Config {
            models_dir: env::var("STOCKCAST_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            sequence_length: parse_env("STOCKCAST_SEQUENCE_LENGTH", defaults.sequence_length)?,
            prediction_days: parse_env("STOCKCAST_PREDICTION_DAYS", defaults.prediction_days)?,
            train_test_split: parse_env("STOCKCAST_TRAIN_TEST_SPLIT", defaults.train_test_split)?,
            train_period: parse_env("STOCKCAST_TRAIN_PERIOD", defaults.train_period)?,
            predict_lookback: parse_env("STOCKCAST_PREDICT_LOOKBACK", defaults.predict_lookback)?,
            indicators: IndicatorParams::default(),
            forest,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sequence_length == 0 {
            bail!("sequence length must be positive");
        }
        if self.prediction_days == 0 {
            bail!("prediction days must be positive");
        }
        if !(self.train_test_split > 0.0 && self.train_test_split < 1.0) {
            bail!(
                "train/test split must be inside (0, 1), got {}",
                self.train_test_split
            );
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid value for {name}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sequence_length, 60);
        assert_eq!(config.prediction_days, 1);
        assert_eq!(config.train_test_split, 0.8);
        assert_eq!(config.train_period, Period::TwoYears);
        assert_eq!(config.predict_lookback, Period::ThreeMonths);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_split_bounds_rejected() {
        let mut config = Config::default();
        config.train_test_split = 1.0;
        assert!(config.validate().is_err());
        config.train_test_split = 0.0;
        assert!(config.validate().is_err());
        config.train_test_split = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_lengths_rejected() {
        let mut config = Config::default();
        config.sequence_length = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.prediction_days = 0;
        assert!(config.validate().is_err());
    }
}
