//! Windowing of scaled feature matrices into model input sequences.

use crate::application::scaling::MinMaxScaler;
use crate::domain::errors::ForecastError;
use crate::domain::features::{CLOSE_COLUMN, FeatureMatrix};

/// Minimum number of windows a training run needs.
pub const MIN_TRAINING_WINDOWS: usize = 100;

/// One model input: `sequence_length` consecutive scaled feature rows.
pub type Window = Vec<Vec<f64>>;

/// Training windows with their targets and the scaler that produced them.
/// Order is chronological; callers must not shuffle before splitting.
#[derive(Debug)]
pub struct TrainingSequences {
    pub windows: Vec<Window>,
    /// Scaled close `prediction_days` after each window's end.
    pub targets: Vec<f64>,
    pub feature_scaler: MinMaxScaler,
}

/// Slices a feature matrix into fixed-length windows.
///
/// The scaler is fit over the *entire* supplied matrix in both paths:
/// at training time that is the full historical window, at inference time
/// the short recent lookback. Those are two different fitting contexts,
/// both intentional.
#[derive(Debug, Clone)]
pub struct SequenceBuilder {
    sequence_length: usize,
    prediction_days: usize,
}

impl SequenceBuilder {
    pub fn new(sequence_length: usize, prediction_days: usize) -> Self {
        Self {
            sequence_length,
            prediction_days,
        }
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn prediction_days(&self) -> usize {
        self.prediction_days
    }

    /// Builds every training window: for each index `i` in
    /// `[sequence_length, len - prediction_days]` the window covers rows
    /// `[i - sequence_length, i)` and the target is the scaled close at
    /// row `i + prediction_days - 1`.
    ///
    /// Fails with `InsufficientData` when fewer than
    /// [`MIN_TRAINING_WINDOWS`] windows can be produced.
    pub fn training_sequences(
        &self,
        matrix: &FeatureMatrix,
    ) -> Result<TrainingSequences, ForecastError> {
        let n = matrix.len();
        let count = (n + 1).saturating_sub(self.sequence_length + self.prediction_days);
        if count < MIN_TRAINING_WINDOWS {
            return Err(ForecastError::InsufficientData {
                required: MIN_TRAINING_WINDOWS,
                actual: count,
            });
        }

        let feature_scaler = MinMaxScaler::fit(matrix);
        let scaled = feature_scaler.transform(matrix)?;

        let mut windows = Vec::with_capacity(count);
        let mut targets = Vec::with_capacity(count);
        for i in self.sequence_length..=(n - self.prediction_days) {
            windows.push(scaled[i - self.sequence_length..i].to_vec());
            targets.push(scaled[i + self.prediction_days - 1][CLOSE_COLUMN]);
        }

        Ok(TrainingSequences {
            windows,
            targets,
            feature_scaler,
        })
    }

    /// Builds the single most recent window for inference, with a scaler
    /// fit freshly over the supplied (short) matrix.
    ///
    /// Fails with `InsufficientData` when fewer than `sequence_length`
    /// rows are available.
    pub fn latest_window(
        &self,
        matrix: &FeatureMatrix,
    ) -> Result<(Window, MinMaxScaler), ForecastError> {
        let n = matrix.len();
        if n < self.sequence_length {
            return Err(ForecastError::InsufficientData {
                required: self.sequence_length,
                actual: n,
            });
        }

        let feature_scaler = MinMaxScaler::fit(matrix);
        let scaled = feature_scaler.transform(matrix)?;
        let window = scaled[n - self.sequence_length..].to_vec();
        Ok((window, feature_scaler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::FEATURE_COUNT;
    use approx::assert_relative_eq;

    /// Matrix with ascending close values and mild variation elsewhere.
    fn synthetic_matrix(n: usize) -> FeatureMatrix {
        (0..n)
            .map(|i| {
                let mut row = vec![0.5; FEATURE_COUNT];
                row[0] = i as f64; // open
                row[CLOSE_COLUMN] = 100.0 + i as f64;
                row
            })
            .collect()
    }

    #[test]
    fn test_window_count_matches_formula() {
        let builder = SequenceBuilder::new(60, 1);
        let sequences = builder.training_sequences(&synthetic_matrix(500)).unwrap();

        // 500 - 60 - 1 + 1
        assert_eq!(sequences.windows.len(), 440);
        assert_eq!(sequences.targets.len(), 440);
        for window in &sequences.windows {
            assert_eq!(window.len(), 60);
            assert_eq!(window[0].len(), FEATURE_COUNT);
        }
    }

    #[test]
    fn test_n_minus_sequence_length_windows() {
        let builder = SequenceBuilder::new(60, 1);
        let sequences = builder.training_sequences(&synthetic_matrix(200)).unwrap();
        assert_eq!(sequences.windows.len(), 200 - 60);
    }

    #[test]
    fn test_insufficient_windows_rejected() {
        let builder = SequenceBuilder::new(60, 1);
        // 159 rows -> 99 windows, one short of the floor
        let err = builder
            .training_sequences(&synthetic_matrix(159))
            .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientData {
                required: MIN_TRAINING_WINDOWS,
                actual: 99
            }
        ));

        assert!(builder.training_sequences(&synthetic_matrix(160)).is_ok());
    }

    #[test]
    fn test_target_alignment() {
        let builder = SequenceBuilder::new(60, 1);
        let matrix = synthetic_matrix(200);
        let sequences = builder.training_sequences(&matrix).unwrap();

        // The last target is the scaled close of the last row: the column
        // maximum, which maps to 1.0.
        assert_relative_eq!(*sequences.targets.last().unwrap(), 1.0);
        // The first target is the close of row `sequence_length`.
        let expected = (matrix[60][CLOSE_COLUMN] - matrix[0][CLOSE_COLUMN])
            / (matrix[199][CLOSE_COLUMN] - matrix[0][CLOSE_COLUMN]);
        assert_relative_eq!(sequences.targets[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_latest_window() {
        let builder = SequenceBuilder::new(60, 1);
        let matrix = synthetic_matrix(70);
        let (window, scaler) = builder.latest_window(&matrix).unwrap();

        assert_eq!(window.len(), 60);
        // last row of the window is the matrix's last row, whose close is
        // the maximum of the short window
        assert_relative_eq!(window[59][CLOSE_COLUMN], 1.0);
        assert_relative_eq!(
            scaler.inverse_value(CLOSE_COLUMN, window[59][CLOSE_COLUMN]),
            matrix[69][CLOSE_COLUMN],
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_latest_window_needs_sequence_length_rows() {
        let builder = SequenceBuilder::new(60, 1);
        let err = builder.latest_window(&synthetic_matrix(59)).unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientData {
                required: 60,
                actual: 59
            }
        ));
    }
}
