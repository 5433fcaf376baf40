//! Analysis pipeline
//!
//! Raw meter records flow through daily aggregation, range scaling and
//! windowing into the forecast oracle; the aligned predictions then feed
//! anomaly detection, the consumption trend and the savings projections.
//! One [`AnalysisPipeline::run`] owns every intermediate value it creates
//! and shares nothing with other runs.

pub mod aggregate;
pub mod anomaly;
pub mod error;
pub mod scaler;
pub mod trend;
pub mod window;

pub use aggregate::{DailyAggregator, IngestionSummary};
pub use anomaly::{AnomalyDetector, AnomalyThreshold};
pub use error::PipelineError;
pub use scaler::{RangeScaler, ScaledSeries};
pub use trend::{ConsumptionTrend, TrendStatus, DEFAULT_RECENT_WINDOW_DAYS, DEFAULT_TREND_FACTOR};
pub use window::{SequenceWindower, WindowedSample, DEFAULT_LOOK_BACK};

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{AnomalyRecord, DailySeries, ForecastResult, RawRecord};
use crate::forecast::{align_forecasts, ForecastMetrics};
use crate::ml::ForecastOracle;
use crate::savings::{ActionPlan, InvoiceInput, SavingsProjection, SustainabilityRecommender};

/// Tunables of one analysis run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub look_back: usize,
    pub threshold: AnomalyThreshold,
    pub recent_window_days: usize,
    pub trend_factor: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            look_back: DEFAULT_LOOK_BACK,
            threshold: AnomalyThreshold::default(),
            recent_window_days: DEFAULT_RECENT_WINDOW_DAYS,
            trend_factor: DEFAULT_TREND_FACTOR,
        }
    }
}

impl PipelineSettings {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.look_back == 0 {
            return Err(PipelineError::Configuration("look_back must be at least 1".into()));
        }
        if self.recent_window_days == 0 {
            return Err(PipelineError::Configuration(
                "recent_window_days must be at least 1".into(),
            ));
        }
        if !self.threshold.value().is_finite() {
            return Err(PipelineError::Configuration("anomaly threshold must be finite".into()));
        }
        if !(self.trend_factor.is_finite() && self.trend_factor > 0.0) {
            return Err(PipelineError::Configuration("trend_factor must be positive".into()));
        }
        Ok(())
    }
}

/// Invoice-driven projections to include in a report
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsRequest {
    pub invoice: InvoiceInput,
    pub percentage: Option<u32>,
    pub actions: Vec<String>,
}

/// Savings section of a report
#[derive(Debug, Clone, Default, Serialize)]
pub struct SavingsSummary {
    pub baseline_goal: Option<SavingsProjection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive: Option<SavingsProjection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_plan: Option<ActionPlan>,
    /// Set when the invoice-driven projections were rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output of one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub ingestion: IngestionSummary,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
    pub look_back: usize,
    pub scaler: RangeScaler,
    pub forecasts: Vec<ForecastResult>,
    /// Absent when no day could be forecast
    pub metrics: Option<ForecastMetrics>,
    pub threshold: AnomalyThreshold,
    pub anomalies: Vec<AnomalyRecord>,
    pub trend: Option<ConsumptionTrend>,
    pub savings: SavingsSummary,
    pub duration_ms: u64,
}

/// Single entry point shared by the CLI and the HTTP surface
#[derive(Clone)]
pub struct AnalysisPipeline {
    oracle: Arc<dyn ForecastOracle>,
    settings: PipelineSettings,
    recommender: SustainabilityRecommender,
    aggregator: DailyAggregator,
}

impl std::fmt::Debug for AnalysisPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisPipeline")
            .field("settings", &self.settings)
            .field("recommender", &self.recommender)
            .finish_non_exhaustive()
    }
}

impl AnalysisPipeline {
    pub fn new(
        oracle: Arc<dyn ForecastOracle>,
        settings: PipelineSettings,
        recommender: SustainabilityRecommender,
    ) -> Result<Self, PipelineError> {
        settings.validate()?;
        Ok(Self {
            oracle,
            settings,
            recommender,
            aggregator: DailyAggregator::new(),
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn recommender(&self) -> &SustainabilityRecommender {
        &self.recommender
    }

    pub fn run<I>(&self, records: I) -> Result<AnalysisReport, PipelineError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        self.run_with(records, None)
    }

    /// Full run, optionally projecting savings for a user's invoice.
    ///
    /// Invalid invoice figures do not fail the run; the savings section
    /// carries the rejection instead.
    pub fn run_with<I>(
        &self,
        records: I,
        request: Option<&SavingsRequest>,
    ) -> Result<AnalysisReport, PipelineError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let started = Instant::now();
        let (series, ingestion) = self.aggregator.aggregate(records)?;
        info!(
            days = series.len(),
            dropped = ingestion.dropped_records,
            "daily series ready"
        );

        let scaled = ScaledSeries::fit(&series);
        let forecasts = self.forecast(&series, &scaled)?;

        let metrics = ForecastMetrics::from_results(&forecasts).ok();
        if let Some(m) = &metrics {
            info!(metrics = %m, "forecast accuracy");
            if m.rmse > self.settings.threshold.value() {
                warn!(
                    rmse = m.rmse,
                    threshold = self.settings.threshold.value(),
                    "live forecast error exceeds the anomaly threshold"
                );
            }
        }

        let anomalies = AnomalyDetector::new(self.settings.threshold).detect(&forecasts);

        let actuals: Vec<f64> = if forecasts.is_empty() {
            series.values()
        } else {
            forecasts.iter().map(|r| r.actual).collect()
        };
        let trend = ConsumptionTrend::compute(
            &actuals,
            self.settings.recent_window_days,
            self.settings.trend_factor,
        );

        let mut savings = SavingsSummary {
            baseline_goal: self.recommender.baseline_goal(&actuals),
            ..SavingsSummary::default()
        };
        if let Some(request) = request {
            self.apply_request(request, &mut savings);
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            forecasts = forecasts.len(),
            anomalies = anomalies.len(),
            duration_ms,
            "analysis run complete"
        );

        Ok(AnalysisReport {
            generated_at: Utc::now(),
            ingestion,
            first_day: series.first_date(),
            last_day: series.last_date(),
            look_back: self.settings.look_back,
            scaler: *scaled.scaler(),
            forecasts,
            metrics,
            threshold: self.settings.threshold,
            anomalies,
            trend,
            savings,
            duration_ms,
        })
    }

    /// Window the scaled series, query the oracle once and align the
    /// inverse-scaled predictions with the days they describe.
    pub fn forecast(
        &self,
        series: &DailySeries,
        scaled: &ScaledSeries,
    ) -> Result<Vec<ForecastResult>, PipelineError> {
        let look_back = self.settings.look_back;
        let windower = SequenceWindower::new(scaled.values(), look_back);
        if windower.sample_count() == 0 {
            warn!(
                days = series.len(),
                look_back, "series too short to forecast any day"
            );
            return Ok(Vec::new());
        }

        let batch = windower.batch()?;
        let predictions = self.oracle.predict(&batch).map_err(PipelineError::Oracle)?;
        if predictions.len() != batch.len() {
            return Err(PipelineError::OracleContractViolation {
                expected: batch.len(),
                actual: predictions.len(),
            });
        }

        let scaler = scaled.scaler();
        let restored: Vec<f64> = predictions
            .iter()
            .map(|p| scaler.inverse_transform(*p))
            .collect();
        align_forecasts(series, &restored, look_back)
    }

    fn apply_request(&self, request: &SavingsRequest, savings: &mut SavingsSummary) {
        if let Some(pct) = request.percentage {
            match self.recommender.interactive(&request.invoice, pct) {
                Ok(p) => savings.interactive = Some(p),
                Err(e) => {
                    warn!(error = %e, "interactive projection rejected");
                    savings.error = Some(e.to_string());
                    return;
                }
            }
        }
        if !request.actions.is_empty() {
            match self.recommender.action_plan(&request.invoice, &request.actions) {
                Ok(plan) => savings.action_plan = Some(plan),
                Err(e) => {
                    warn!(error = %e, "action plan rejected");
                    savings.error = Some(e.to_string());
                }
            }
        }
    }
}
