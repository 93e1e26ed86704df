//! End-to-end pipeline tests against the in-memory provider: train a
//! model, persist it, and forecast from the revived artifact.

use std::sync::Arc;

use chrono::NaiveDate;
use stockcast::application::regressor::LastValueFactory;
use stockcast::application::service::ForecastService;
use stockcast::config::Config;
use stockcast::domain::bar::Bar;
use stockcast::domain::errors::ForecastError;
use stockcast::domain::ports::Period;
use stockcast::infrastructure::mock::MockMarketData;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_test_writer()
        .try_init();
}

/// A sine wave over a gentle upward drift, enough history for the
/// 60-row windows plus the 100-window training floor.
fn synthetic_bars(n: usize) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    (0..n)
        .map(|i| {
            let drift = i as f64 * 0.25;
            let wave = (i as f64 * 0.17).sin() * 3.0;
            let close = 150.0 + drift + wave;
            Bar {
                date: start + chrono::Days::new(i as u64),
                open: close - 0.4,
                high: close + 1.2,
                low: close - 1.2,
                close,
                volume: 25_000.0 + (i as f64 * 0.3).cos() * 1_000.0,
            }
        })
        .collect()
}

fn service_with(symbols: &[&str], dir: &TempDir) -> ForecastService {
    let mut provider = MockMarketData::new();
    for symbol in symbols {
        provider = provider.with_series(*symbol, synthetic_bars(500));
    }
    let config = Config {
        models_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    ForecastService::new(config, Arc::new(provider), Arc::new(LastValueFactory)).unwrap()
}

#[tokio::test]
async fn test_train_then_predict() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let service = service_with(&["DEMO.NS"], &dir);

    let outcome = service.train("demo", None, false).await.unwrap();
    assert_eq!(outcome.symbol, "DEMO.NS");
    assert!(outcome.metrics.is_finite());
    assert!(outcome.metrics.rmse >= 0.0);
    assert!((0.0..=100.0).contains(&outcome.metrics.directional_accuracy));

    let prediction = service.predict("demo", None).await.unwrap();
    assert_eq!(prediction.symbol, "DEMO.NS");
    assert!(prediction.current_price > 0.0);
    assert!(prediction.predicted_price.is_finite());
    assert!((0.0..=100.0).contains(&prediction.confidence));
}

#[tokio::test]
async fn test_predict_without_model_fails_fast() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let service = service_with(&["DEMO.NS"], &dir);

    match service.predict("demo", None).await {
        Err(ForecastError::ModelNotFound { symbol, candidates }) => {
            assert_eq!(symbol, "demo");
            assert!(candidates.contains(&"DEMO.NS".to_string()));
        }
        other => panic!("expected ModelNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_batch_predict_isolates_failures() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let service = service_with(&["AAA.NS", "BBB.NS"], &dir);

    service.train("BBB", None, false).await.unwrap();

    let symbols = vec!["AAA".to_string(), "BBB".to_string()];
    let outcome = service.batch_predict(&symbols, None).await;

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].symbol, "BBB.NS");
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].symbol, "AAA");
    assert!(outcome.errors[0].error.contains("AAA"));
}

#[tokio::test]
async fn test_technical_indicators_without_model() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let service = service_with(&["DEMO.NS"], &dir);

    let snapshot = service
        .technical_indicators("demo", Some(Period::ThreeMonths))
        .await
        .unwrap();
    assert_eq!(snapshot.symbol, "DEMO.NS");
    assert!((0.0..=100.0).contains(&snapshot.latest.rsi));
    assert!(snapshot.latest.sma_20 > 0.0);
    assert!(snapshot.latest.bb_upper >= snapshot.latest.bb_lower);
}

#[tokio::test]
async fn test_trained_symbols_listing() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let service = service_with(&["AAA.NS", "BBB.NS"], &dir);

    assert!(service.trained_symbols().unwrap().is_empty());

    service.train("BBB", None, false).await.unwrap();
    service.train("AAA", None, false).await.unwrap();

    assert_eq!(service.trained_symbols().unwrap(), vec!["AAA.NS", "BBB.NS"]);
}

#[tokio::test]
async fn test_custom_prediction_horizon() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let service = service_with(&["DEMO.NS"], &dir);

    service.train("demo", Some(Period::Max), false).await.unwrap();
    let prediction = service.predict("demo", Some(5)).await.unwrap();
    assert!(prediction.predicted_price.is_finite());
}
