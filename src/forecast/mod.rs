pub mod metrics;

pub use metrics::*;

use crate::domain::{DailySeries, ForecastResult};
use crate::pipeline::PipelineError;

/// Zip inverse-scaled predictions back onto the days they describe.
///
/// Prediction `i` is compared with day `i + look_back + 1` of the series, so
/// `predictions.len()` must equal `series.len() - look_back - 1`.
pub fn align_forecasts(
    series: &DailySeries,
    predictions: &[f64],
    look_back: usize,
) -> Result<Vec<ForecastResult>, PipelineError> {
    let offset = look_back + 1;
    let expected = series.len().saturating_sub(offset);
    if predictions.len() != expected {
        return Err(PipelineError::OracleContractViolation {
            expected,
            actual: predictions.len(),
        });
    }

    Ok(series
        .points()
        .iter()
        .skip(offset)
        .zip(predictions)
        .map(|(point, predicted)| ForecastResult {
            date: point.date,
            predicted: *predicted,
            actual: point.total_active_power,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawRecord;
    use crate::pipeline::DailyAggregator;

    fn series(days: u32) -> DailySeries {
        let records = (1..=days).map(|d| {
            RawRecord::new(&format!("{:02}/01/2010", d), "12:00:00", &format!("{}", d * 10))
        });
        DailyAggregator::new().aggregate(records).unwrap().0
    }

    #[test]
    fn test_alignment_offset() {
        let series = series(10);
        let results = align_forecasts(&series, &[1.0, 2.0], 7).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].date, series.points()[8].date);
        assert_eq!(results[0].actual, 90.0);
        assert_eq!(results[0].predicted, 1.0);
        assert_eq!(results[1].actual, 100.0);
    }

    #[test]
    fn test_mismatched_prediction_count() {
        let series = series(10);
        let result = align_forecasts(&series, &[1.0], 7);
        assert!(matches!(
            result,
            Err(PipelineError::OracleContractViolation { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_short_series_expects_nothing() {
        let series = series(5);
        assert!(align_forecasts(&series, &[], 7).unwrap().is_empty());
    }
}
