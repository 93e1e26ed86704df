use chrono::NaiveDate;
use serde::Serialize;

/// Ordered list of model input columns.
///
/// This order MUST be identical between training and inference for a
/// given symbol; any change here is a breaking change for every persisted
/// model.
pub const FEATURE_COLUMNS: &[&str] = &[
    "open",
    "high",
    "low",
    "close",
    "volume",
    "rsi",
    "macd",
    "macd_signal",
    "macd_hist",
    "sma_20",
    "sma_50",
    "ema_12",
    "bb_upper",
    "bb_middle",
    "bb_lower",
    "bb_width",
    "price_change",
    "high_low_ratio",
    "close_sma20_ratio",
    "volume_ratio",
];

/// Number of model input columns.
pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

/// Position of the close price within [`FEATURE_COLUMNS`]. Targets and
/// inverse price transforms are keyed off this column.
pub const CLOSE_COLUMN: usize = 3;

/// Row-major feature matrix: one row per source bar, [`FEATURE_COUNT`] wide.
pub type FeatureMatrix = Vec<Vec<f64>>;

/// A bar extended with its derived indicator values. One per input bar,
/// same ordering. Carries `volume_sma` even though it is not a model
/// input, so indicator snapshots can report it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub ema_12: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub bb_width: f64,
    pub price_change: f64,
    pub high_low_ratio: f64,
    pub close_sma20_ratio: f64,
    pub volume_sma: f64,
    pub volume_ratio: f64,
}

impl FeatureRow {
    /// Model input values, in [`FEATURE_COLUMNS`] order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.rsi,
            self.macd,
            self.macd_signal,
            self.macd_hist,
            self.sma_20,
            self.sma_50,
            self.ema_12,
            self.bb_upper,
            self.bb_middle,
            self.bb_lower,
            self.bb_width,
            self.price_change,
            self.high_low_ratio,
            self.close_sma20_ratio,
            self.volume_ratio,
        ]
    }
}

/// Projects feature rows onto the fixed model input matrix.
pub fn to_feature_matrix(rows: &[FeatureRow]) -> FeatureMatrix {
    rows.iter().map(|r| r.features().to_vec()).collect()
}

/// Column position by name, if the name is a model input.
pub fn column_index(name: &str) -> Option<usize> {
    FEATURE_COLUMNS.iter().position(|c| *c == name)
}
