//! Min-max range scaling into `[0, 1]`

use serde::Serialize;
use tracing::warn;

use crate::domain::DailySeries;

/// Fitted min-max scaler.
///
/// A degenerate fit (`min == max`) maps every value to `0.0` and inverse
/// transforms every scaled value back to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeScaler {
    min: f64,
    max: f64,
}

impl RangeScaler {
    /// Value assigned to every input when the fitted range is empty
    pub const DEGENERATE_VALUE: f64 = 0.0;

    /// Fit over `values`. An empty slice yields a degenerate `(0, 0)` fit.
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { min: 0.0, max: 0.0 };
        }
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Self { min, max }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_degenerate(&self) -> bool {
        self.range().abs() < f64::EPSILON
    }

    pub fn transform(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return Self::DEGENERATE_VALUE;
        }
        (value - self.min) / self.range()
    }

    pub fn inverse_transform(&self, scaled: f64) -> f64 {
        scaled * self.range() + self.min
    }
}

/// Daily values mapped into `[0, 1]` together with the scaler that produced
/// them. The scaler cannot be replaced, so predictions made from these values
/// are always inverse-transformed with the same fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledSeries {
    values: Vec<f64>,
    scaler: RangeScaler,
}

impl ScaledSeries {
    pub fn fit(series: &DailySeries) -> Self {
        Self::fit_values(&series.values())
    }

    pub fn fit_values(values: &[f64]) -> Self {
        let scaler = RangeScaler::fit(values);
        if scaler.is_degenerate() {
            warn!(
                min = scaler.min(),
                max = scaler.max(),
                "degenerate scaling range, mapping every value to a constant"
            );
        }
        let values = values.iter().map(|v| scaler.transform(*v)).collect();
        Self { values, scaler }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn scaler(&self) -> &RangeScaler {
        &self.scaler
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
