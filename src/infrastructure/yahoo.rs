//! Yahoo Finance chart API client.
//!
//! Fetches daily OHLCV bars from the v8 chart endpoint. Rows with any
//! missing price field are dropped; a missing volume becomes 0.0, which
//! happens on illiquid days for NSE/BSE symbols.

use crate::domain::bar::Bar;
use crate::domain::errors::ForecastError;
use crate::domain::ports::{MarketData, Period};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

pub struct YahooChartClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooChartClient {
    pub fn new() -> Result<Self, ForecastError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ForecastError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("stockcast/0.1")
            .build()
            .map_err(|e| ForecastError::Provider {
                symbol: String::new(),
                reason: format!("http client construction failed: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl MarketData for YahooChartClient {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Vec<Bar>, ForecastError> {
        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);
        debug!(symbol, period = %period, "Requesting daily bars");

        let response = self
            .client
            .get(&url)
            .query(&[("range", period.as_str()), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| ForecastError::Provider {
                symbol: symbol.to_string(),
                reason: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ForecastError::DataUnavailable {
                symbol: symbol.to_string(),
                period: period.to_string(),
            });
        }
        if !status.is_success() {
            return Err(ForecastError::Provider {
                symbol: symbol.to_string(),
                reason: format!("unexpected status {status}"),
            });
        }

        let payload: ChartResponse =
            response.json().await.map_err(|e| ForecastError::Provider {
                symbol: symbol.to_string(),
                reason: format!("response decode failed: {e}"),
            })?;

        if let Some(err) = payload.chart.error {
            return Err(ForecastError::Provider {
                symbol: symbol.to_string(),
                reason: format!("{}: {}", err.code, err.description),
            });
        }

        let result = payload
            .chart
            .result
            .and_then(|mut results| (!results.is_empty()).then(|| results.remove(0)));
        let bars = match result {
            Some(result) => bars_from_chart(symbol, result),
            None => Vec::new(),
        };

        if bars.is_empty() {
            return Err(ForecastError::DataUnavailable {
                symbol: symbol.to_string(),
                period: period.to_string(),
            });
        }
        debug!(symbol, bars = bars.len(), "Daily bars received");
        Ok(bars)
    }
}

/// Maps one chart result into bars, skipping rows with a missing price.
fn bars_from_chart(symbol: &str, result: ChartResult) -> Vec<Bar> {
    let Some(timestamps) = result.timestamp else {
        return Vec::new();
    };
    let Some(quote) = result.indicators.quote.first() else {
        return Vec::new();
    };

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0usize;
    for (i, &ts) in timestamps.iter().enumerate() {
        let row = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = row else {
            skipped += 1;
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()) else {
            skipped += 1;
            continue;
        };
        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
        });
    }
    if skipped > 0 {
        warn!(symbol, skipped, "Dropped bars with missing fields");
    }
    bars
}
