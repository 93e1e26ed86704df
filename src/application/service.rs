//! The forecasting facade: one entry point wiring provider, registry,
//! trainer, and predictor together.

use crate::application::indicators::IndicatorEngine;
use crate::application::predictor::{PredictionResult, PredictionService};
use crate::application::regressor::RegressorFactory;
use crate::application::sequences::SequenceBuilder;
use crate::application::trainer::{TrainingOrchestrator, TrainingOutcome};
use crate::config::Config;
use crate::domain::errors::ForecastError;
use crate::domain::features::FeatureRow;
use crate::domain::ports::{MarketData, Period};
use crate::domain::symbol::normalize;
use crate::infrastructure::registry::ModelRegistry;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Latest indicator values for a symbol, no model involved.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub latest: FeatureRow,
}

/// One failed symbol within a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub symbol: String,
    pub error: String,
}

/// Per-symbol outcomes of a batch prediction. A failing symbol lands in
/// `errors` and never aborts the rest of the batch.
#[derive(Debug, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<PredictionResult>,
    pub errors: Vec<BatchFailure>,
}

pub struct ForecastService {
    config: Config,
    market_data: Arc<dyn MarketData>,
    registry: Arc<ModelRegistry>,
    engine: IndicatorEngine,
    trainer: TrainingOrchestrator,
    predictor: PredictionService,
}

impl ForecastService {
    pub fn new(
        config: Config,
        market_data: Arc<dyn MarketData>,
        factory: Arc<dyn RegressorFactory>,
    ) -> Result<Self, ForecastError> {
        let registry = Arc::new(ModelRegistry::new(&config.models_dir)?);
        let engine = IndicatorEngine::new(config.indicators.clone());
        let builder = SequenceBuilder::new(config.sequence_length, config.prediction_days);

        let trainer = TrainingOrchestrator::new(
            Arc::clone(&market_data),
            Arc::clone(&registry),
            Arc::clone(&factory),
            engine.clone(),
            builder.clone(),
            config.train_test_split,
        );
        let predictor = PredictionService::new(
            Arc::clone(&market_data),
            Arc::clone(&registry),
            factory,
            engine.clone(),
            builder,
            config.predict_lookback,
        );

        Ok(Self {
            config,
            market_data,
            registry,
            engine,
            trainer,
            predictor,
        })
    }

    /// Trains and publishes a model for `symbol`. `period` defaults to the
    /// configured training period.
    pub async fn train(
        &self,
        symbol: &str,
        period: Option<Period>,
        retrain: bool,
    ) -> Result<TrainingOutcome, ForecastError> {
        let period = period.unwrap_or(self.config.train_period);
        self.trainer.train(symbol, period, retrain).await
    }

    /// Forecasts the next close for `symbol` using its persisted model.
    pub async fn predict(
        &self,
        symbol: &str,
        days_ahead: Option<usize>,
    ) -> Result<PredictionResult, ForecastError> {
        let days_ahead = days_ahead.unwrap_or(self.config.prediction_days);
        self.predictor.predict(symbol, days_ahead).await
    }

    /// Runs [`Self::predict`] per symbol sequentially, collecting failures
    /// instead of propagating them.
    pub async fn batch_predict(&self, symbols: &[String], days_ahead: Option<usize>) -> BatchOutcome {
        let mut results = Vec::new();
        let mut errors = Vec::new();
        for symbol in symbols {
            match self.predict(symbol, days_ahead).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(symbol, error = %e, "Batch prediction symbol failed");
                    errors.push(BatchFailure {
                        symbol: symbol.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        BatchOutcome { results, errors }
    }

    /// Latest technical-indicator values for `symbol`, computed fresh from
    /// provider data. Works for untrained symbols.
    pub async fn technical_indicators(
        &self,
        symbol: &str,
        period: Option<Period>,
    ) -> Result<IndicatorSnapshot, ForecastError> {
        let key = normalize(symbol);
        let period = period.unwrap_or(self.config.predict_lookback);

        let bars = self.market_data.fetch_daily_bars(&key, period).await?;
        let rows = self.engine.compute(&key, &bars)?;
        let latest = rows
            .last()
            .copied()
            .ok_or_else(|| ForecastError::DataUnavailable {
                symbol: key.clone(),
                period: period.to_string(),
            })?;

        Ok(IndicatorSnapshot {
            symbol: key,
            latest,
        })
    }

    /// Registry keys with a persisted model, sorted.
    pub fn trained_symbols(&self) -> Result<Vec<String>, ForecastError> {
        self.registry.trained_symbols()
    }
}
