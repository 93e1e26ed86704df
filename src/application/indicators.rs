//! Technical-indicator computation over an ordered daily bar series.
//!
//! All indicators are computed over the full input series before any
//! windowing, then warm-up gaps are resolved by a three-step fill:
//! backward-fill, forward-fill, zero-fill — in that exact order. The
//! order matters: leading rolling-window gaps take the first valid value
//! of their column, which is what the persisted models were trained on.

use crate::domain::bar::{Bar, validate_series};
use crate::domain::errors::ForecastError;
use crate::domain::features::FeatureRow;

/// Rolling-window and span parameters for every derived column.
#[derive(Debug, Clone)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub ema_period: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub volume_sma_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            sma_short: 20,
            sma_long: 50,
            ema_period: 12,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            volume_sma_period: 20,
        }
    }
}

/// Derives the feature columns from raw bars.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    params: IndicatorParams,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn with_defaults() -> Self {
        Self::new(IndicatorParams::default())
    }

    /// Computes one [`FeatureRow`] per input bar, same ordering.
    ///
    /// Fails with `InvalidSeries` on duplicate or unordered dates. After
    /// the fill pass no column contains a missing value.
    pub fn compute(&self, symbol: &str, bars: &[Bar]) -> Result<Vec<FeatureRow>, ForecastError> {
        validate_series(symbol, bars)?;
        if bars.is_empty() {
            return Ok(Vec::new());
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        let n = bars.len();

        let mut rsi = self.rsi(&closes);
        let (mut macd, mut macd_signal, mut macd_hist) = self.macd(&closes);
        let mut sma_20 = rolling_mean(&closes, self.params.sma_short);
        let mut sma_50 = rolling_mean(&closes, self.params.sma_long);
        let mut ema_12 = ema(&closes, self.params.ema_period);
        let (mut bb_upper, mut bb_middle, mut bb_lower, mut bb_width) = self.bollinger(&closes);

        let mut price_change = pct_change(&closes);
        let mut high_low_ratio: Vec<f64> = highs.iter().zip(&lows).map(|(h, l)| h / l).collect();
        let mut close_sma20_ratio: Vec<f64> =
            closes.iter().zip(&sma_20).map(|(c, s)| c / s).collect();

        let mut volume_sma = rolling_mean(&volumes, self.params.volume_sma_period);
        let mut volume_ratio: Vec<f64> =
            volumes.iter().zip(&volume_sma).map(|(v, s)| v / s).collect();

        for column in [
            &mut rsi,
            &mut macd,
            &mut macd_signal,
            &mut macd_hist,
            &mut sma_20,
            &mut sma_50,
            &mut ema_12,
            &mut bb_upper,
            &mut bb_middle,
            &mut bb_lower,
            &mut bb_width,
            &mut price_change,
            &mut high_low_ratio,
            &mut close_sma20_ratio,
            &mut volume_sma,
            &mut volume_ratio,
        ] {
            fill_missing(column);
        }

        let rows = (0..n)
            .map(|i| FeatureRow {
                date: bars[i].date,
                open: bars[i].open,
                high: bars[i].high,
                low: bars[i].low,
                close: bars[i].close,
                volume: bars[i].volume,
                rsi: rsi[i],
                macd: macd[i],
                macd_signal: macd_signal[i],
                macd_hist: macd_hist[i],
                sma_20: sma_20[i],
                sma_50: sma_50[i],
                ema_12: ema_12[i],
                bb_upper: bb_upper[i],
                bb_middle: bb_middle[i],
                bb_lower: bb_lower[i],
                bb_width: bb_width[i],
                price_change: price_change[i],
                high_low_ratio: high_low_ratio[i],
                close_sma20_ratio: close_sma20_ratio[i],
                volume_sma: volume_sma[i],
                volume_ratio: volume_ratio[i],
            })
            .collect();

        Ok(rows)
    }

    /// RSI over rolling mean gains/losses. When the trailing loss is zero
    /// the ratio is undefined: with gains present RSI is pinned to 100,
    /// with a flat window the value stays missing and the fill pass
    /// resolves it.
    fn rsi(&self, closes: &[f64]) -> Vec<f64> {
        let period = self.params.rsi_period;
        let n = closes.len();

        let mut gains = vec![f64::NAN; n];
        let mut losses = vec![f64::NAN; n];
        for i in 1..n {
            let delta = closes[i] - closes[i - 1];
            gains[i] = delta.max(0.0);
            losses[i] = (-delta).max(0.0);
        }

        let avg_gain = rolling_mean(&gains, period);
        let avg_loss = rolling_mean(&losses, period);

        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&gain, &loss)| {
                if gain.is_nan() || loss.is_nan() {
                    f64::NAN
                } else if loss == 0.0 {
                    if gain > 0.0 { 100.0 } else { f64::NAN }
                } else {
                    let rs = gain / loss;
                    100.0 - 100.0 / (1.0 + rs)
                }
            })
            .collect()
    }

    fn macd(&self, closes: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let ema_fast = ema(closes, self.params.macd_fast);
        let ema_slow = ema(closes, self.params.macd_slow);
        let macd: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
        let signal = ema(&macd, self.params.macd_signal);
        let hist: Vec<f64> = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();
        (macd, signal, hist)
    }

    fn bollinger(&self, closes: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
        let period = self.params.bollinger_period;
        let mult = self.params.bollinger_std_dev;
        let middle = rolling_mean(closes, period);
        let std = rolling_std(closes, period);

        let n = closes.len();
        let mut upper = vec![f64::NAN; n];
        let mut lower = vec![f64::NAN; n];
        let mut width = vec![f64::NAN; n];
        for i in 0..n {
            let band = mult * std[i];
            upper[i] = middle[i] + band;
            lower[i] = middle[i] - band;
            width[i] = upper[i] - lower[i];
        }
        (upper, middle, lower, width)
    }
}

/// Trailing simple moving average. The first `window - 1` slots are
/// missing, and a missing input anywhere in the window keeps the output
/// missing.
fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 {
        return out;
    }
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = slice.iter().sum::<f64>() / window as f64;
    }
    out
}

/// Trailing sample standard deviation (ddof = 1), aligned with
/// [`rolling_mean`] over the same window.
fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window < 2 {
        return out;
    }
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance =
            slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window as f64 - 1.0);
        out[i] = variance.sqrt();
    }
    out
}

/// Recursive exponential moving average seeded by the first value, with
/// smoothing factor `2 / (span + 1)`.
fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(n);
    out.push(values[0]);
    for i in 1..n {
        let prev = out[i - 1];
        out.push(alpha * values[i] + (1.0 - alpha) * prev);
    }
    out
}

/// Day-over-day percent change; the first slot is missing.
fn pct_change(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    for i in 1..n {
        out[i] = (values[i] - values[i - 1]) / values[i - 1];
    }
    out
}

/// Three-step missing-value resolution, applied per column in this exact
/// order: backward-fill, forward-fill, zero-fill.
fn fill_missing(column: &mut [f64]) {
    let mut next_valid = f64::NAN;
    for v in column.iter_mut().rev() {
        if v.is_nan() {
            *v = next_valid;
        } else {
            next_valid = *v;
        }
    }

    let mut prev_valid = f64::NAN;
    for v in column.iter_mut() {
        if v.is_nan() {
            *v = prev_valid;
        } else {
            prev_valid = *v;
        }
    }

    for v in column.iter_mut() {
        if v.is_nan() {
            *v = 0.0;
        }
    }
}
