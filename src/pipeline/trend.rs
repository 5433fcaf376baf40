//! Recent-versus-overall consumption comparison

use serde::{Deserialize, Serialize};

/// Days in the "recent" window
pub const DEFAULT_RECENT_WINDOW_DAYS: usize = 30;
/// Recent mean above `overall × factor` counts as elevated
pub const DEFAULT_TREND_FACTOR: f64 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStatus {
    AboveAverage,
    UnderControl,
}

/// Rolling-mean comparison reported alongside anomalies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionTrend {
    pub overall_mean: f64,
    pub recent_mean: f64,
    /// Days that actually went into `recent_mean`
    pub recent_days: usize,
    pub status: TrendStatus,
}

/// Mean of the last `window` values (or of all values when there are fewer)
pub fn tail_mean(values: &[f64], window: usize) -> Option<f64> {
    if values.is_empty() || window == 0 {
        return None;
    }
    let tail = &values[values.len().saturating_sub(window)..];
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}

impl ConsumptionTrend {
    pub fn compute(values: &[f64], window: usize, factor: f64) -> Option<Self> {
        let overall_mean = tail_mean(values, values.len())?;
        let recent_mean = tail_mean(values, window)?;
        let status = if recent_mean > overall_mean * factor {
            TrendStatus::AboveAverage
        } else {
            TrendStatus::UnderControl
        };
        Some(Self {
            overall_mean,
            recent_mean,
            recent_days: window.min(values.len()),
            status,
        })
    }
}
