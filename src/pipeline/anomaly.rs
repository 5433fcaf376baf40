//! Residual-based anomaly detection
//!
//! A day is anomalous when it consumed more than the forecast by strictly
//! more than a fixed threshold. Under-consumption is never flagged.

use serde::{Deserialize, Serialize};

use crate::domain::{AnomalyRecord, ForecastResult};

/// Static anomaly threshold in consumption units.
///
/// Derived offline from the forecaster's known error: `multiplier × typical
/// RMSE`. It is never recalibrated during a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyThreshold(pub f64);

impl AnomalyThreshold {
    /// Test-set RMSE of the reference sequence model
    pub const REFERENCE_RMSE: f64 = 405.0;
    pub const REFERENCE_MULTIPLIER: f64 = 2.5;

    pub fn from_rmse(rmse: f64, multiplier: f64) -> Self {
        Self(rmse * multiplier)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for AnomalyThreshold {
    fn default() -> Self {
        Self::from_rmse(Self::REFERENCE_RMSE, Self::REFERENCE_MULTIPLIER)
    }
}

/// Stateless filter over aligned forecast results
#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyDetector {
    threshold: AnomalyThreshold,
}

impl AnomalyDetector {
    pub fn new(threshold: AnomalyThreshold) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> AnomalyThreshold {
        self.threshold
    }

    pub fn is_anomalous(&self, result: &ForecastResult) -> bool {
        result.residual() > self.threshold.value()
    }

    /// Anomalies in input (chronological) order
    pub fn detect(&self, results: &[ForecastResult]) -> Vec<AnomalyRecord> {
        results
            .iter()
            .filter(|r| self.is_anomalous(r))
            .map(|r| AnomalyRecord {
                date: r.date,
                predicted: r.predicted,
                actual: r.actual,
                residual: r.residual(),
            })
            .collect()
    }
}
