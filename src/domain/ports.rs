use crate::domain::bar::Bar;
use crate::domain::errors::ForecastError;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Lookback period accepted by the market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    FiveYears,
    TenYears,
    Max,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
            Period::Max => "max",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1mo" => Ok(Period::OneMonth),
            "3mo" => Ok(Period::ThreeMonths),
            "6mo" => Ok(Period::SixMonths),
            "1y" => Ok(Period::OneYear),
            "2y" => Ok(Period::TwoYears),
            "5y" => Ok(Period::FiveYears),
            "10y" => Ok(Period::TenYears),
            "max" => Ok(Period::Max),
            _ => anyhow::bail!(
                "Invalid period: {}. Must be one of 1mo, 3mo, 6mo, 1y, 2y, 5y, 10y, max",
                s
            ),
        }
    }
}

/// Daily-bar provider. Implementations return chronological bars,
/// earliest first, and fail with `DataUnavailable` for symbols the
/// venue does not know. Fetches are blocking from the caller's point of
/// view and may take seconds.
#[async_trait]
pub trait MarketData: Send + Sync {
    async fn fetch_daily_bars(&self, symbol: &str, period: Period)
    -> Result<Vec<Bar>, ForecastError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_round_trip() {
        for s in ["1mo", "3mo", "6mo", "1y", "2y", "5y", "10y", "max"] {
            let period: Period = s.parse().unwrap();
            assert_eq!(period.as_str(), s);
        }
    }

    #[test]
    fn test_unknown_period_rejected() {
        assert!("7w".parse::<Period>().is_err());
    }
}
