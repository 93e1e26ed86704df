//! In-memory market-data provider for tests and demos.

use crate::domain::bar::Bar;
use crate::domain::errors::ForecastError;
use crate::domain::ports::{MarketData, Period};
use async_trait::async_trait;
use std::collections::HashMap;

/// Serves pre-registered bar series keyed by symbol. Period selection
/// takes the most recent slice, using the usual trading-day counts per
/// calendar period.
#[derive(Debug, Default)]
pub struct MockMarketData {
    series: HashMap<String, Vec<Bar>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.series.insert(symbol.into(), bars);
        self
    }

    fn trading_days(period: Period) -> Option<usize> {
        match period {
            Period::OneMonth => Some(21),
            Period::ThreeMonths => Some(63),
            Period::SixMonths => Some(126),
            Period::OneYear => Some(252),
            Period::TwoYears => Some(504),
            Period::FiveYears => Some(1260),
            Period::TenYears => Some(2520),
            Period::Max => None,
        }
    }
}

#[async_trait]
impl MarketData for MockMarketData {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Vec<Bar>, ForecastError> {
        let bars = self
            .series
            .get(symbol)
            .ok_or_else(|| ForecastError::DataUnavailable {
                symbol: symbol.to_string(),
                period: period.to_string(),
            })?;

        let slice = match Self::trading_days(period) {
            Some(days) if bars.len() > days => &bars[bars.len() - days..],
            _ => &bars[..],
        };
        Ok(slice.to_vec())
    }
}
