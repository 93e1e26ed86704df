use crate::domain::errors::ForecastError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data. Immutable once fetched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Rejects series whose dates are not strictly ascending.
///
/// Gaps (holidays, halts) are fine; duplicates and reordering are not,
/// since every downstream rolling computation assumes chronology.
pub fn validate_series(symbol: &str, bars: &[Bar]) -> Result<(), ForecastError> {
    for pair in bars.windows(2) {
        if pair[1].date <= pair[0].date {
            let reason = if pair[1].date == pair[0].date {
                format!("duplicate date {}", pair[1].date)
            } else {
                format!("date {} follows {}", pair[1].date, pair[0].date)
            };
            return Err(ForecastError::InvalidSeries {
                symbol: symbol.to_string(),
                reason,
            });
        }
    }
    Ok(())
}
