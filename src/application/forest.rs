//! Random-forest implementation of the regressor capability.
//!
//! Windows are flattened row-major into one feature vector per sample;
//! the forest fits in a single shot, so the validation series and the
//! best-checkpoint distinction of epoch-style trainers do not apply.

use crate::application::regressor::{Regressor, RegressorFactory, Validation};
use crate::application::sequences::Window;
use crate::domain::errors::ForecastError;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::{debug, info};

/// Hyperparameters for the random-forest regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
        }
    }
}

type ForestModel = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

pub struct ForestRegressor {
    params: ForestParams,
    model: Option<ForestModel>,
}

impl ForestRegressor {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            model: None,
        }
    }

    fn flatten(window: &Window) -> Vec<f64> {
        window.iter().flatten().copied().collect()
    }
}

impl Regressor for ForestRegressor {
    fn fit(
        &mut self,
        windows: &[Window],
        targets: &[f64],
        validation: Option<&Validation<'_>>,
    ) -> Result<(), ForecastError> {
        if let Some(validation) = validation {
            // single-shot fit: nothing to stop early, the held-out series
            // is evaluated by the orchestrator afterwards
            debug!(
                samples = validation.windows.len(),
                "validation series noted, forest fits in one shot"
            );
        }

        let rows: Vec<Vec<f64>> = windows.iter().map(Self::flatten).collect();
        let x = DenseMatrix::from_2d_vec(&rows).map_err(|e| ForecastError::TrainingFailure {
            stage: "fit".to_string(),
            reason: format!("matrix creation failed: {e}"),
        })?;

        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.params.n_trees)
            .with_max_depth(self.params.max_depth)
            .with_min_samples_split(self.params.min_samples_split);

        info!(
            samples = windows.len(),
            n_trees = self.params.n_trees,
            max_depth = self.params.max_depth,
            "Fitting random forest"
        );

        let model = RandomForestRegressor::fit(&x, &targets.to_vec(), params).map_err(|e| {
            ForecastError::TrainingFailure {
                stage: "fit".to_string(),
                reason: e.to_string(),
            }
        })?;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, window: &Window) -> Result<f64, ForecastError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ForecastError::TrainingFailure {
                stage: "predict".to_string(),
                reason: "regressor has not been fitted".to_string(),
            })?;

        let x = DenseMatrix::from_2d_vec(&vec![Self::flatten(window)]).map_err(|e| {
            ForecastError::TrainingFailure {
                stage: "predict".to_string(),
                reason: format!("matrix creation failed: {e}"),
            }
        })?;

        let predictions = model
            .predict(&x)
            .map_err(|e| ForecastError::TrainingFailure {
                stage: "predict".to_string(),
                reason: e.to_string(),
            })?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| ForecastError::TrainingFailure {
                stage: "predict".to_string(),
                reason: "no prediction returned".to_string(),
            })
    }

    fn to_bytes(&self) -> Result<Vec<u8>, ForecastError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ForecastError::TrainingFailure {
                stage: "serialize".to_string(),
                reason: "regressor has not been fitted".to_string(),
            })?;
        serde_json::to_vec(model).map_err(|e| ForecastError::Codec {
            context: "forest regressor state".to_string(),
            source: e,
        })
    }

    fn name(&self) -> &'static str {
        "random-forest"
    }
}

/// Factory for [`ForestRegressor`] with fixed hyperparameters.
#[derive(Debug, Clone, Default)]
pub struct ForestFactory {
    params: ForestParams,
}

impl ForestFactory {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }
}

impl RegressorFactory for ForestFactory {
    fn untrained(&self) -> Box<dyn Regressor> {
        Box::new(ForestRegressor::new(self.params.clone()))
    }

    fn from_bytes(&self, blob: &[u8]) -> Result<Box<dyn Regressor>, ForecastError> {
        let model: ForestModel = serde_json::from_slice(blob).map_err(|e| ForecastError::Codec {
            context: "forest regressor state".to_string(),
            source: e,
        })?;
        Ok(Box::new(ForestRegressor {
            params: self.params.clone(),
            model: Some(model),
        }))
    }
}
