//! Min-max feature scaling with serializable fitted state.
//!
//! Two independently-owned scaler values exist per symbol: one fitted
//! over the full feature matrix, one over the close-price column alone.
//! They are always passed explicitly to the operation that needs them —
//! never shared mutable state — so transform order cannot corrupt either.

use crate::domain::errors::ForecastError;
use serde::{Deserialize, Serialize};

/// A fitted min-max transform: per-column domain min/max mapped onto
/// [0, 1]. Zero-range columns scale to 0.0 and invert back to the column
/// minimum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    mins: Vec<f64>,
    /// Per-column `max - min`, with 1.0 substituted where the range is
    /// zero so degenerate columns stay well-defined in both directions.
    scales: Vec<f64>,
}

impl MinMaxScaler {
    /// Fits over every column of a row-major matrix.
    pub fn fit(matrix: &[Vec<f64>]) -> Self {
        let width = matrix.first().map(Vec::len).unwrap_or(0);
        let mut mins = vec![f64::INFINITY; width];
        let mut maxs = vec![f64::NEG_INFINITY; width];
        for row in matrix {
            for (col, &value) in row.iter().enumerate() {
                mins[col] = mins[col].min(value);
                maxs[col] = maxs[col].max(value);
            }
        }
        let scales = mins
            .iter()
            .zip(&maxs)
            .map(|(min, max)| {
                let range = max - min;
                if range == 0.0 { 1.0 } else { range }
            })
            .collect();
        Self { mins, scales }
    }

    /// Fits a single-column scaler, e.g. over close prices alone.
    pub fn fit_column(values: &[f64]) -> Self {
        let rows: Vec<Vec<f64>> = values.iter().map(|&v| vec![v]).collect();
        Self::fit(&rows)
    }

    pub fn width(&self) -> usize {
        self.mins.len()
    }

    /// Scales one row into [0, 1] per fitted column.
    ///
    /// Fails when the row width does not match the fitted width, which
    /// would silently mix feature orderings otherwise.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, ForecastError> {
        if row.len() != self.mins.len() {
            return Err(ForecastError::TrainingFailure {
                stage: "scale".to_string(),
                reason: format!(
                    "row width {} does not match fitted width {}",
                    row.len(),
                    self.mins.len()
                ),
            });
        }
        Ok(row
            .iter()
            .enumerate()
            .map(|(col, &value)| (value - self.mins[col]) / self.scales[col])
            .collect())
    }

    pub fn transform(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ForecastError> {
        matrix.iter().map(|row| self.transform_row(row)).collect()
    }

    /// Maps one scaled value back into the original domain of `column`.
    pub fn inverse_value(&self, column: usize, scaled: f64) -> f64 {
        scaled * self.scales[column] + self.mins[column]
    }

    pub fn inverse_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(col, &value)| self.inverse_value(col, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_round_trip() {
        let matrix = vec![
            vec![1.0, 100.0, -5.0],
            vec![2.0, 150.0, 0.0],
            vec![3.0, 50.0, 5.0],
        ];
        let scaler = MinMaxScaler::fit(&matrix);
        let scaled = scaler.transform(&matrix).unwrap();

        for (row, scaled_row) in matrix.iter().zip(&scaled) {
            for &v in scaled_row {
                assert!((0.0..=1.0).contains(&v));
            }
            let restored = scaler.inverse_row(scaled_row);
            for (orig, back) in row.iter().zip(&restored) {
                assert_relative_eq!(orig, back, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_zero_range_column() {
        let matrix = vec![vec![7.0, 1.0], vec![7.0, 2.0]];
        let scaler = MinMaxScaler::fit(&matrix);
        let scaled = scaler.transform(&matrix).unwrap();

        assert_relative_eq!(scaled[0][0], 0.0);
        assert_relative_eq!(scaled[1][0], 0.0);
        assert_relative_eq!(scaler.inverse_value(0, 0.0), 7.0);
    }

    #[test]
    fn test_fit_column_inverse() {
        let closes = vec![90.0, 110.0, 100.0];
        let scaler = MinMaxScaler::fit_column(&closes);

        assert_eq!(scaler.width(), 1);
        assert_relative_eq!(scaler.inverse_value(0, 0.0), 90.0);
        assert_relative_eq!(scaler.inverse_value(0, 1.0), 110.0);
        assert_relative_eq!(scaler.inverse_value(0, 0.5), 100.0);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let scaler = MinMaxScaler::fit(&[vec![0.0, 1.0]]);
        assert!(scaler.transform_row(&[1.0]).is_err());
    }

    #[test]
    fn test_state_serialization_round_trip() {
        let scaler = MinMaxScaler::fit(&[vec![1.0, 5.0], vec![3.0, 9.0]]);
        let json = serde_json::to_string(&scaler).unwrap();
        let restored: MinMaxScaler = serde_json::from_str(&json).unwrap();

        assert_relative_eq!(restored.inverse_value(1, 0.5), 7.0);
    }
}
