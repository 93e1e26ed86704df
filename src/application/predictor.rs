//! Inference over persisted models: resolve, revive, forecast.

use crate::application::indicators::IndicatorEngine;
use crate::application::regressor::RegressorFactory;
use crate::application::scaling::MinMaxScaler;
use crate::application::sequences::SequenceBuilder;
use crate::domain::errors::ForecastError;
use crate::domain::features::to_feature_matrix;
use crate::domain::ports::{MarketData, Period};
use crate::infrastructure::registry::ModelRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// How many recent closes feed the confidence heuristic.
const CONFIDENCE_LOOKBACK: usize = 20;

/// A single next-close forecast.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    /// Registry key the model was resolved under.
    pub symbol: String,
    pub current_price: f64,
    pub predicted_price: f64,
    pub predicted_change_pct: f64,
    /// Stability score in [0, 100] derived from the coefficient of
    /// variation of recent closes. A volatility heuristic, not a
    /// statistical confidence interval.
    pub confidence: f64,
    pub predicted_at: DateTime<Utc>,
}

pub struct PredictionService {
    market_data: Arc<dyn MarketData>,
    registry: Arc<ModelRegistry>,
    factory: Arc<dyn RegressorFactory>,
    engine: IndicatorEngine,
    builder: SequenceBuilder,
    lookback: Period,
}

impl PredictionService {
    pub fn new(
        market_data: Arc<dyn MarketData>,
        registry: Arc<ModelRegistry>,
        factory: Arc<dyn RegressorFactory>,
        engine: IndicatorEngine,
        builder: SequenceBuilder,
        lookback: Period,
    ) -> Self {
        Self {
            market_data,
            registry,
            factory,
            engine,
            builder,
            lookback,
        }
    }

    /// Forecasts the close `days_ahead` trading days out for `symbol`.
    ///
    /// Resolution happens before any network call, so an untrained symbol
    /// fails fast with `ModelNotFound`. Scalers are refit over the recent
    /// lookback rather than loaded from the training artifact; the model
    /// therefore sees inputs normalized to recent ranges.
    pub async fn predict(
        &self,
        symbol: &str,
        days_ahead: usize,
    ) -> Result<PredictionResult, ForecastError> {
        let resolved = self.registry.resolve(symbol)?;
        let regressor = self.factory.from_bytes(&resolved.model_blob)?;
        let key = resolved.key;

        let bars = self
            .market_data
            .fetch_daily_bars(&key, self.lookback)
            .await?;
        let rows = self.engine.compute(&key, &bars)?;
        let matrix = to_feature_matrix(&rows);

        let (window, _feature_scaler) = self.builder.latest_window(&matrix)?;
        let scaled_prediction = regressor.predict(&window)?;

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let current_price = closes
            .last()
            .copied()
            .ok_or_else(|| ForecastError::DataUnavailable {
                symbol: key.clone(),
                period: self.lookback.to_string(),
            })?;

        let price_scaler = MinMaxScaler::fit_column(&closes);
        let predicted_price = price_scaler.inverse_value(0, scaled_prediction);
        let predicted_change_pct = (predicted_price - current_price) / current_price * 100.0;
        let confidence = confidence_score(&closes);

        info!(
            symbol = %key,
            days_ahead,
            slot = ?resolved.slot,
            current = current_price,
            predicted = predicted_price,
            "Forecast produced"
        );
        Ok(PredictionResult {
            symbol: key,
            current_price,
            predicted_price,
            predicted_change_pct,
            confidence,
            predicted_at: Utc::now(),
        })
    }
}

/// `clamp(0, 100, 100 - cv * 100)` over the trailing closes, where `cv`
/// is the sample coefficient of variation. Degenerate inputs (fewer than
/// two closes, or zero mean) score 0.0.
fn confidence_score(closes: &[f64]) -> f64 {
    let tail = &closes[closes.len().saturating_sub(CONFIDENCE_LOOKBACK)..];
    if tail.len() < 2 {
        return 0.0;
    }
    let n = tail.len() as f64;
    let mean = tail.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = tail.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let cv = variance.sqrt() / mean.abs();
    (100.0 - cv * 100.0).clamp(0.0, 100.0)
}
