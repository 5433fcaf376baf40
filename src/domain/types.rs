use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ============================================================================
// Meter Readings
// ============================================================================

/// Textual meter record as it appears in the feed, before any parsing.
///
/// Fields are `None` when the column was missing or carried the feed's
/// missing-value sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Calendar date, `dd/mm/yyyy`
    pub date: Option<String>,
    /// Wall-clock time in the meter's local zone, `HH:MM:SS`
    pub time: Option<String>,
    /// Global active power, decimal text
    pub active_power: Option<String>,
}

impl RawRecord {
    pub fn new(date: &str, time: &str, active_power: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            time: Some(time.to_string()),
            active_power: Some(active_power.to_string()),
        }
    }
}

/// A parsed, immutable power reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    /// Local (naive) timestamp of the sample
    pub timestamp: NaiveDateTime,
    /// Average active power over the sampling interval
    pub active_power: f64,
}

impl RawReading {
    pub const DATE_FORMAT: &'static str = "%d/%m/%Y";
    pub const TIME_FORMAT: &'static str = "%H:%M:%S";

    /// Parse a textual record. Returns `None` when a required field is absent
    /// or does not parse.
    pub fn parse(record: &RawRecord) -> Option<Self> {
        let date = record.date.as_deref()?.trim();
        let time = record.time.as_deref()?.trim();
        let power = record.active_power.as_deref()?.trim();

        let date = NaiveDate::parse_from_str(date, Self::DATE_FORMAT).ok()?;
        let time = chrono::NaiveTime::parse_from_str(time, Self::TIME_FORMAT).ok()?;
        let active_power = power.parse::<f64>().ok().filter(|p| p.is_finite())?;

        Some(Self {
            timestamp: date.and_time(time),
            active_power,
        })
    }

    /// Calendar day of the reading in the meter's local day boundary
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

// ============================================================================
// Daily Series
// ============================================================================

/// Total consumption of one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub total_active_power: f64,
}

/// Gap-free daily consumption series, strictly increasing by date.
///
/// Only the aggregator builds one, so the ordering invariant holds for every
/// instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySeries {
    points: Vec<DailyPoint>,
}

impl DailySeries {
    pub(crate) fn from_sorted(points: Vec<DailyPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self { points }
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.total_active_power).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

// ============================================================================
// Forecast & Anomaly Records
// ============================================================================

/// Prediction for one day next to what was actually consumed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub date: NaiveDate,
    /// Inverse-scaled prediction
    pub predicted: f64,
    pub actual: f64,
}

impl ForecastResult {
    pub fn residual(&self) -> f64 {
        self.actual - self.predicted
    }
}

/// Day whose consumption exceeded the forecast by more than the threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub date: NaiveDate,
    pub predicted: f64,
    pub actual: f64,
    /// `actual - predicted`
    pub residual: f64,
}
