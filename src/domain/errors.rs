use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the forecasting core.
///
/// Batch callers are expected to record these per symbol instead of
/// aborting; see `ForecastService::batch_predict`.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Input bars were malformed: duplicate or out-of-order dates.
    #[error("Invalid bar series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    /// The market-data provider returned nothing for the symbol/period.
    #[error("No market data for {symbol} over {period}")]
    DataUnavailable { symbol: String, period: String },

    /// Fewer rows or windows than the minimum an operation requires.
    #[error("Insufficient data: need {required}, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Registry resolution exhausted every candidate key.
    #[error("No trained model for {symbol} (tried {candidates:?})")]
    ModelNotFound {
        symbol: String,
        candidates: Vec<String>,
    },

    /// The regressor failed to fit, predict, or produced non-finite metrics.
    #[error("Training failed at {stage}: {reason}")]
    TrainingFailure { stage: String, reason: String },

    /// Transport-level provider failure (network, decode, rate limit).
    #[error("Market data request for {symbol} failed: {reason}")]
    Provider { symbol: String, reason: String },

    /// Filesystem fault while reading or publishing an artifact.
    #[error("Artifact storage at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization fault in persisted state.
    #[error("Artifact encoding for {context}: {source}")]
    Codec {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found_lists_candidates() {
        let err = ForecastError::ModelNotFound {
            symbol: "RELIANCE".to_string(),
            candidates: vec!["RELIANCE".to_string(), "RELIANCE.NS".to_string()],
        };

        let msg = err.to_string();
        assert!(msg.contains("RELIANCE"));
        assert!(msg.contains("RELIANCE.NS"));
    }

    #[test]
    fn test_insufficient_data_formatting() {
        let err = ForecastError::InsufficientData {
            required: 100,
            actual: 42,
        };

        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("42"));
    }
}
