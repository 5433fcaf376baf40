//! Forecast accuracy metrics
//!
//! MAE, RMSE, MAPE and R² over aligned forecast results. The anomaly
//! threshold is static, but reporting the live RMSE next to it shows when the
//! configured threshold has drifted away from the model's actual error.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ForecastResult;

/// Forecast accuracy metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Square Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error (%), zero-consumption days excluded
    pub mape: f64,
    /// R² (coefficient of determination)
    pub r2: f64,
    /// Number of samples evaluated
    pub sample_count: usize,
    /// Largest absolute error
    pub max_error: f64,
    /// Mean of `actual - predicted`; positive means the model under-forecasts
    pub mean_residual: f64,
}

impl ForecastMetrics {
    pub fn from_results(results: &[ForecastResult]) -> Result<Self, ForecastMetricsError> {
        let actual: Vec<f64> = results.iter().map(|r| r.actual).collect();
        let predicted: Vec<f64> = results.iter().map(|r| r.predicted).collect();
        Self::calculate(&actual, &predicted)
    }

    /// Calculate metrics from actual and predicted values
    pub fn calculate(actual: &[f64], predicted: &[f64]) -> Result<Self, ForecastMetricsError> {
        if actual.len() != predicted.len() {
            return Err(ForecastMetricsError::DimensionMismatch {
                actual: actual.len(),
                predicted: predicted.len(),
            });
        }

        if actual.is_empty() {
            return Err(ForecastMetricsError::EmptyData);
        }

        let n = actual.len() as f64;
        let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();

        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        let squared_sum: f64 = errors.iter().map(|e| e * e).sum();
        let rmse = (squared_sum / n).sqrt();

        let percentage_errors: Vec<f64> = actual
            .iter()
            .zip(&errors)
            .filter(|(a, _)| a.abs() > 1e-6)
            .map(|(a, e)| e.abs() / a.abs() * 100.0)
            .collect();
        let mape = if percentage_errors.is_empty() {
            0.0
        } else {
            percentage_errors.iter().sum::<f64>() / percentage_errors.len() as f64
        };

        let mean_actual = actual.iter().sum::<f64>() / n;
        let total_variance: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
        let r2 = if total_variance > 1e-10 {
            1.0 - squared_sum / total_variance
        } else {
            0.0
        };

        let max_error = errors.iter().map(|e| e.abs()).fold(0.0f64, f64::max);
        let mean_residual = errors.iter().sum::<f64>() / n;

        Ok(ForecastMetrics {
            mae,
            rmse,
            mape,
            r2,
            sample_count: actual.len(),
            max_error,
            mean_residual,
        })
    }

    /// Assess forecast quality based on MAPE
    pub fn quality(&self) -> ForecastQuality {
        if self.mape < 5.0 {
            ForecastQuality::Excellent
        } else if self.mape < 10.0 {
            ForecastQuality::Good
        } else if self.mape < 20.0 {
            ForecastQuality::Fair
        } else if self.mape < 50.0 {
            ForecastQuality::Poor
        } else {
            ForecastQuality::VeryPoor
        }
    }
}

impl fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Metrics: MAE={:.3}, RMSE={:.3}, MAPE={:.2}%, R²={:.3}, Quality={:?}",
            self.mae,
            self.rmse,
            self.mape,
            self.r2,
            self.quality()
        )
    }
}

/// Forecast quality classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastQuality {
    Excellent, // MAPE < 5%
    Good,      // MAPE 5-10%
    Fair,      // MAPE 10-20%
    Poor,      // MAPE 20-50%
    VeryPoor,  // MAPE > 50%
}

/// Forecast metrics calculation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ForecastMetricsError {
    #[error("Dimension mismatch: actual={actual}, predicted={predicted}")]
    DimensionMismatch { actual: usize, predicted: usize },

    #[error("Empty data provided")]
    EmptyData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_forecast() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let predicted = actual.clone();

        let metrics = ForecastMetrics::calculate(&actual, &predicted).unwrap();

        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.rmse, 0.0);
        assert_eq!(metrics.mape, 0.0);
        assert_eq!(metrics.r2, 1.0);
        assert_eq!(metrics.quality(), ForecastQuality::Excellent);
    }

    #[test]
    fn test_rmse_and_residual_sign() {
        let actual = vec![500.0, 520.0, 1200.0];
        let predicted = vec![480.0, 500.0, 500.0];

        let metrics = ForecastMetrics::calculate(&actual, &predicted).unwrap();

        // sqrt((400 + 400 + 490000) / 3)
        assert!((metrics.rmse - (490_800.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(metrics.max_error, 700.0);
        assert!((metrics.mean_residual - 740.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.sample_count, 3);
    }

    #[test]
    fn test_zero_actuals_skipped_in_mape() {
        let metrics = ForecastMetrics::calculate(&[0.0, 100.0], &[10.0, 110.0]).unwrap();
        assert!((metrics.mape - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = ForecastMetrics::calculate(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(ForecastMetricsError::DimensionMismatch { actual: 3, predicted: 2 })
        ));
    }

    #[test]
    fn test_empty_data() {
        assert!(matches!(
            ForecastMetrics::calculate(&[], &[]),
            Err(ForecastMetricsError::EmptyData)
        ));
    }
}
