//! End-to-end training runs: fetch, featurize, window, fit, evaluate,
//! publish.

use crate::application::indicators::IndicatorEngine;
use crate::application::regressor::{Regressor, RegressorFactory, Validation};
use crate::application::scaling::MinMaxScaler;
use crate::application::sequences::{SequenceBuilder, Window};
use crate::config::MODEL_VERSION;
use crate::domain::errors::ForecastError;
use crate::domain::features::{CLOSE_COLUMN, to_feature_matrix};
use crate::domain::metrics::EvaluationMetrics;
use crate::domain::ports::{MarketData, Period};
use crate::domain::symbol::normalize;
use crate::infrastructure::registry::{ArtifactMeta, ModelRegistry, NewArtifact};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a completed training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingOutcome {
    /// Registry key the artifact was stored under.
    pub symbol: String,
    /// Held-out evaluation in price units.
    pub metrics: EvaluationMetrics,
}

pub struct TrainingOrchestrator {
    market_data: Arc<dyn MarketData>,
    registry: Arc<ModelRegistry>,
    factory: Arc<dyn RegressorFactory>,
    engine: IndicatorEngine,
    builder: SequenceBuilder,
    train_test_split: f64,
}

impl TrainingOrchestrator {
    pub fn new(
        market_data: Arc<dyn MarketData>,
        registry: Arc<ModelRegistry>,
        factory: Arc<dyn RegressorFactory>,
        engine: IndicatorEngine,
        builder: SequenceBuilder,
        train_test_split: f64,
    ) -> Self {
        Self {
            market_data,
            registry,
            factory,
            engine,
            builder,
            train_test_split,
        }
    }

    /// Trains a fresh model for `symbol` over `period` of history and
    /// publishes it, replacing any previous artifact. `retrain` is
    /// accepted for callers that distinguish first-time training from
    /// refreshes; the run is identical either way since every run starts
    /// from an untrained model.
    pub async fn train(
        &self,
        symbol: &str,
        period: Period,
        retrain: bool,
    ) -> Result<TrainingOutcome, ForecastError> {
        let key = normalize(symbol);
        if retrain {
            info!(symbol = %key, "Retraining requested, replacing existing artifact");
        }
        info!(symbol = %key, %period, "Training run started");

        let bars = self.market_data.fetch_daily_bars(&key, period).await?;
        if bars.is_empty() {
            return Err(ForecastError::DataUnavailable {
                symbol: key,
                period: period.to_string(),
            });
        }

        let rows = self.engine.compute(&key, &bars)?;
        let matrix = to_feature_matrix(&rows);
        let sequences = self.builder.training_sequences(&matrix)?;

        // chronological split, never shuffled
        let split = (sequences.windows.len() as f64 * self.train_test_split) as usize;
        let (train_windows, test_windows) = sequences.windows.split_at(split);
        let (train_targets, test_targets) = sequences.targets.split_at(split);
        info!(
            symbol = %key,
            train = train_windows.len(),
            test = test_windows.len(),
            "Sequences built"
        );

        let mut regressor = self.factory.untrained();
        regressor.fit(
            train_windows,
            train_targets,
            Some(&Validation {
                windows: test_windows,
                targets: test_targets,
            }),
        )?;

        // evaluation happens in price units: inverse-transform both the
        // model outputs and the held-out targets through a close-only
        // scaler fitted on the same history
        let closes: Vec<f64> = matrix.iter().map(|row| row[CLOSE_COLUMN]).collect();
        let price_scaler = MinMaxScaler::fit_column(&closes);

        let predicted = predict_prices(regressor.as_ref(), test_windows, &price_scaler)?;
        let actual: Vec<f64> = test_targets
            .iter()
            .map(|&t| price_scaler.inverse_value(0, t))
            .collect();

        let metrics = EvaluationMetrics::compute(&actual, &predicted);
        if !metrics.is_finite() {
            warn!(symbol = %key, ?metrics, "Non-finite evaluation metrics");
            return Err(ForecastError::TrainingFailure {
                stage: "evaluate".to_string(),
                reason: "held-out metrics are not finite".to_string(),
            });
        }

        let meta = ArtifactMeta {
            symbol: key.clone(),
            trained_at: Utc::now(),
            version: MODEL_VERSION.to_string(),
            metrics,
        };
        let blob = regressor.to_bytes()?;
        self.registry.store(
            &key,
            &NewArtifact {
                model_blob: &blob,
                feature_scaler: &sequences.feature_scaler,
                price_scaler: &price_scaler,
                meta,
            },
        )?;

        info!(
            symbol = %key,
            model = regressor.name(),
            rmse = metrics.rmse,
            directional_accuracy = metrics.directional_accuracy,
            "Training run complete"
        );
        Ok(TrainingOutcome {
            symbol: key,
            metrics,
        })
    }
}

fn predict_prices(
    regressor: &dyn Regressor,
    windows: &[Window],
    price_scaler: &MinMaxScaler,
) -> Result<Vec<f64>, ForecastError> {
    windows
        .iter()
        .map(|w| {
            regressor
                .predict(w)
                .map(|scaled| price_scaler.inverse_value(0, scaled))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::regressor::LastValueFactory;
    use crate::domain::bar::Bar;
    use crate::infrastructure::mock::MockMarketData;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn synthetic_bars(n: usize) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        (0..n)
            .map(|i| {
                let drift = i as f64 * 0.3;
                let wave = (i as f64 * 0.21).sin() * 4.0;
                let close = 100.0 + drift + wave;
                Bar {
                    date: start + chrono::Days::new(i as u64),
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 10_000.0 + (i as f64 * 0.5).cos() * 500.0,
                }
            })
            .collect()
    }

    fn orchestrator(dir: &TempDir, bars: Vec<Bar>) -> TrainingOrchestrator {
        let provider = MockMarketData::new().with_series("TEST.NS", bars);
        TrainingOrchestrator::new(
            Arc::new(provider),
            Arc::new(ModelRegistry::new(dir.path()).unwrap()),
            Arc::new(LastValueFactory),
            IndicatorEngine::with_defaults(),
            SequenceBuilder::new(60, 1),
            0.8,
        )
    }

    #[tokio::test]
    async fn test_train_publishes_artifact() {
        let dir = TempDir::new().unwrap();
        let trainer = orchestrator(&dir, synthetic_bars(400));

        let outcome = trainer.train("test", Period::Max, false).await.unwrap();
        assert_eq!(outcome.symbol, "TEST.NS");
        assert!(outcome.metrics.is_finite());
        assert!(outcome.metrics.mae >= 0.0);

        let registry = ModelRegistry::new(dir.path()).unwrap();
        let resolved = registry.resolve("TEST").unwrap();
        assert_eq!(resolved.key, "TEST.NS");
        let meta = resolved.meta.unwrap();
        assert_eq!(meta.version, MODEL_VERSION);
    }

    #[tokio::test]
    async fn test_train_rejects_short_history() {
        let dir = TempDir::new().unwrap();
        let trainer = orchestrator(&dir, synthetic_bars(120));

        assert!(matches!(
            trainer.train("test", Period::Max, false).await,
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[tokio::test]
    async fn test_train_unknown_symbol() {
        let dir = TempDir::new().unwrap();
        let trainer = orchestrator(&dir, synthetic_bars(400));

        assert!(matches!(
            trainer.train("other", Period::Max, false).await,
            Err(ForecastError::DataUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_retrain_overwrites() {
        let dir = TempDir::new().unwrap();
        let trainer = orchestrator(&dir, synthetic_bars(400));

        trainer.train("test", Period::Max, false).await.unwrap();
        let outcome = trainer.train("test", Period::Max, true).await.unwrap();
        assert_eq!(outcome.symbol, "TEST.NS");
    }
}
