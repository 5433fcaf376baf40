//! Daily resampling of raw meter readings
//!
//! Readings are parsed, bucketed by local calendar day and summed. Days
//! between the first and last reading with no surviving readings are filled
//! with zero so the series is gap-free.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::PipelineError;
use crate::domain::{DailyPoint, DailySeries, RawReading, RawRecord};

/// Bookkeeping about one aggregation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    /// Records seen in the feed
    pub total_records: usize,
    /// Records dropped for missing or unparseable fields
    pub dropped_records: usize,
    /// Days in the resulting series
    pub days: usize,
    /// Days with no surviving readings, filled with zero
    pub filled_days: usize,
}

/// Sums readings into a gap-free [`DailySeries`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DailyAggregator;

impl DailyAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Parse and aggregate textual records. Unparseable records are skipped.
    pub fn aggregate<I>(&self, records: I) -> Result<(DailySeries, IngestionSummary), PipelineError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut total = 0usize;
        let mut readings = Vec::new();
        for record in records {
            total += 1;
            if let Some(reading) = RawReading::parse(&record) {
                readings.push(reading);
            }
        }

        if total == 0 {
            return Err(PipelineError::ingestion("feed contained no records"));
        }
        if readings.is_empty() {
            return Err(PipelineError::ingestion(format!(
                "none of the {total} records could be parsed"
            )));
        }

        let dropped = total - readings.len();
        let (series, filled_days) = Self::resample(&readings);
        let summary = IngestionSummary {
            total_records: total,
            dropped_records: dropped,
            days: series.len(),
            filled_days,
        };

        debug!(
            total_records = total,
            dropped_records = dropped,
            days = summary.days,
            filled_days,
            "aggregated meter feed into daily series"
        );

        Ok((series, summary))
    }

    /// Aggregate already-parsed readings.
    pub fn aggregate_readings(&self, readings: &[RawReading]) -> Result<DailySeries, PipelineError> {
        if readings.is_empty() {
            return Err(PipelineError::ingestion("no readings to aggregate"));
        }
        Ok(Self::resample(readings).0)
    }

    fn resample(readings: &[RawReading]) -> (DailySeries, usize) {
        let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for reading in readings {
            *totals.entry(reading.day()).or_insert(0.0) += reading.active_power;
        }

        let (Some(&first), Some(&last)) = (totals.keys().next(), totals.keys().next_back()) else {
            return (DailySeries::from_sorted(Vec::new()), 0);
        };

        let mut points = Vec::new();
        let mut filled = 0usize;
        let mut day = first;
        while day <= last {
            let total = match totals.get(&day) {
                Some(total) => *total,
                None => {
                    filled += 1;
                    0.0
                }
            };
            points.push(DailyPoint {
                date: day,
                total_active_power: total,
            });
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }

        (DailySeries::from_sorted(points), filled)
    }
}
