use serde::{Deserialize, Serialize};

/// Held-out evaluation metrics, all computed in the original (un-scaled)
/// price domain. Immutable once computed for a training run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// Mean absolute percentage error. Non-finite when any actual price is
    /// zero; callers reject non-finite metric sets.
    pub mape: f64,
    pub r2: f64,
    /// Percent of consecutive day-over-day moves whose sign the model got
    /// right. 0.0 when fewer than two test points exist (vacuous case).
    pub directional_accuracy: f64,
}

impl EvaluationMetrics {
    /// Computes the full metric set over aligned actual/predicted series.
    ///
    /// Both slices must be the same non-zero length; the caller guarantees
    /// this since it produced one prediction per held-out target.
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Self {
        let n = actual.len() as f64;

        let mae = actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| (a - p).abs())
            .sum::<f64>()
            / n;
        let mse = actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| (a - p).powi(2))
            .sum::<f64>()
            / n;
        let rmse = mse.sqrt();
        let mape = actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| ((a - p) / a).abs())
            .sum::<f64>()
            / n
            * 100.0;

        let mean_actual = actual.iter().sum::<f64>() / n;
        let ss_tot = actual.iter().map(|a| (a - mean_actual).powi(2)).sum::<f64>();
        let ss_res = actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| (a - p).powi(2))
            .sum::<f64>();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Self {
            mae,
            mse,
            rmse,
            mape,
            r2,
            directional_accuracy: directional_accuracy(actual, predicted),
        }
    }

    /// True when every metric is a finite number. A non-finite set marks
    /// the training run as failed.
    pub fn is_finite(&self) -> bool {
        [
            self.mae,
            self.mse,
            self.rmse,
            self.mape,
            self.r2,
            self.directional_accuracy,
        ]
        .iter()
        .all(|m| m.is_finite())
    }
}

/// Fraction (as a percent) of consecutive pairs where the actual and
/// predicted day-over-day deltas agree in sign. Needs at least two points;
/// below that the value is defined as 0.0.
fn directional_accuracy(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() < 2 {
        return 0.0;
    }
    let pairs = actual.len() - 1;
    let agreements = (1..actual.len())
        .filter(|&i| (actual[i] - actual[i - 1] > 0.0) == (predicted[i] - predicted[i - 1] > 0.0))
        .count();
    agreements as f64 / pairs as f64 * 100.0
}
