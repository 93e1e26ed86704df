//! The sequence-to-value regressor capability boundary.
//!
//! The pipeline never depends on a concrete model framework: training and
//! prediction go through [`Regressor`], and persistence/revival go
//! through [`RegressorFactory`]. Swapping the model family means swapping
//! the factory handed to the services.

use crate::application::sequences::Window;
use crate::domain::errors::ForecastError;
use crate::domain::features::CLOSE_COLUMN;
use serde::{Deserialize, Serialize};

/// Held-out series a trainer may use for early stopping or checkpoint
/// selection. Implementations without an epoch loop ignore it.
pub struct Validation<'a> {
    pub windows: &'a [Window],
    pub targets: &'a [f64],
}

/// A learned mapping from one `(sequence_length × feature_count)` window
/// to one scalar (the scaled close). `fit` may run for minutes and blocks
/// the caller; `predict` is fast and deterministic once fitted.
pub trait Regressor: Send + Sync {
    fn fit(
        &mut self,
        windows: &[Window],
        targets: &[f64],
        validation: Option<&Validation<'_>>,
    ) -> Result<(), ForecastError>;

    fn predict(&self, window: &Window) -> Result<f64, ForecastError>;

    /// Trained state as an opaque blob for the registry. Inference-only:
    /// reviving the blob must not require optimizer or trainer state.
    fn to_bytes(&self) -> Result<Vec<u8>, ForecastError>;

    fn name(&self) -> &'static str;
}

/// Creates and revives regressors of one family.
pub trait RegressorFactory: Send + Sync {
    fn untrained(&self) -> Box<dyn Regressor>;

    fn from_bytes(&self, blob: &[u8]) -> Result<Box<dyn Regressor>, ForecastError>;
}

/// Echoes the last scaled close of each window.
///
/// Exists to exercise the full train/persist/predict pipeline without
/// real training cost; a naive persistence-forecast baseline.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LastValueRegressor {
    fitted: bool,
}

impl Regressor for LastValueRegressor {
    fn fit(
        &mut self,
        windows: &[Window],
        _targets: &[f64],
        _validation: Option<&Validation<'_>>,
    ) -> Result<(), ForecastError> {
        if windows.is_empty() {
            return Err(ForecastError::TrainingFailure {
                stage: "fit".to_string(),
                reason: "no training windows".to_string(),
            });
        }
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, window: &Window) -> Result<f64, ForecastError> {
        window
            .last()
            .and_then(|row| row.get(CLOSE_COLUMN))
            .copied()
            .ok_or_else(|| ForecastError::TrainingFailure {
                stage: "predict".to_string(),
                reason: "window has no close column".to_string(),
            })
    }

    fn to_bytes(&self) -> Result<Vec<u8>, ForecastError> {
        serde_json::to_vec(self).map_err(|e| ForecastError::Codec {
            context: "last-value regressor state".to_string(),
            source: e,
        })
    }

    fn name(&self) -> &'static str {
        "last-value"
    }
}

/// Factory for [`LastValueRegressor`].
#[derive(Debug, Default, Clone)]
pub struct LastValueFactory;

impl RegressorFactory for LastValueFactory {
    fn untrained(&self) -> Box<dyn Regressor> {
        Box::new(LastValueRegressor::default())
    }

    fn from_bytes(&self, blob: &[u8]) -> Result<Box<dyn Regressor>, ForecastError> {
        let regressor: LastValueRegressor =
            serde_json::from_slice(blob).map_err(|e| ForecastError::Codec {
                context: "last-value regressor state".to_string(),
                source: e,
            })?;
        Ok(Box::new(regressor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::FEATURE_COUNT;
    use approx::assert_relative_eq;

    fn window_with_last_close(close: f64) -> Window {
        let mut last = vec![0.0; FEATURE_COUNT];
        last[CLOSE_COLUMN] = close;
        vec![vec![0.0; FEATURE_COUNT], last]
    }

    #[test]
    fn test_last_value_predicts_last_close() {
        let mut regressor = LastValueRegressor::default();
        let windows = vec![window_with_last_close(0.25)];
        regressor.fit(&windows, &[0.3], None).unwrap();

        assert_relative_eq!(regressor.predict(&windows[0]).unwrap(), 0.25);
    }

    #[test]
    fn test_fit_rejects_empty_input() {
        let mut regressor = LastValueRegressor::default();
        assert!(matches!(
            regressor.fit(&[], &[], None),
            Err(ForecastError::TrainingFailure { .. })
        ));
    }

    #[test]
    fn test_factory_round_trip() {
        let factory = LastValueFactory;
        let mut regressor = factory.untrained();
        let windows = vec![window_with_last_close(0.8)];
        regressor.fit(&windows, &[0.8], None).unwrap();

        let blob = regressor.to_bytes().unwrap();
        let revived = factory.from_bytes(&blob).unwrap();
        assert_relative_eq!(revived.predict(&windows[0]).unwrap(), 0.8);
    }
}
