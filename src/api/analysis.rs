use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use super::{error::ApiError, response::ApiResponse, AppState};
use crate::{
    pipeline::{AnalysisReport, PipelineError, SavingsRequest},
    savings::InvoiceInput,
};

/// Optional invoice figures to project alongside the analysis
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AnalysisQuery {
    pub kwh: Option<f64>,
    pub cost: Option<f64>,
    #[validate(range(min = 1, max = 100))]
    pub percentage: Option<u32>,
    /// Comma-separated action ids
    pub actions: Option<String>,
}

impl AnalysisQuery {
    fn savings_request(&self) -> Result<Option<SavingsRequest>, ApiError> {
        let actions: Vec<String> = self
            .actions
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect();

        match (self.kwh, self.cost) {
            (Some(kwh), Some(cost)) => Ok(Some(SavingsRequest {
                invoice: InvoiceInput::new(kwh, cost),
                percentage: self.percentage,
                actions,
            })),
            (None, None) if self.percentage.is_none() && actions.is_empty() => Ok(None),
            _ => Err(ApiError::BadRequest(
                "kwh and cost are both required for savings projections".to_string(),
            )),
        }
    }
}

/// GET /api/v1/analysis - Run the full pipeline over the configured feed
pub async fn get_analysis(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<ApiResponse<AnalysisReport>>, ApiError> {
    query.validate()?;
    let request = query.savings_request()?;

    let report = tokio::task::spawn_blocking(move || -> Result<AnalysisReport, PipelineError> {
        let records = state.reader.read_path(&state.feed_path)?;
        state.pipeline.run_with(records, request.as_ref())
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("analysis task failed: {}", e)))??;

    let duration_ms = report.duration_ms;
    let anomalies = report.anomalies.len();
    Ok(Json(
        ApiResponse::success(report)
            .with_count(anomalies)
            .with_duration(duration_ms),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_invoice_means_no_request() {
        assert!(AnalysisQuery::default().savings_request().unwrap().is_none());
    }

    #[test]
    fn test_actions_are_split_and_trimmed() {
        let query = AnalysisQuery {
            kwh: Some(350.0),
            cost: Some(110.25),
            percentage: None,
            actions: Some("led_lighting, unplug_idle,".to_string()),
        };
        let request = query.savings_request().unwrap().unwrap();
        assert_eq!(request.actions, vec!["led_lighting", "unplug_idle"]);
    }

    #[test]
    fn test_half_an_invoice_is_rejected() {
        let query = AnalysisQuery {
            kwh: Some(350.0),
            ..AnalysisQuery::default()
        };
        assert!(matches!(query.savings_request(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_percentage_bounds_validated() {
        let query = AnalysisQuery {
            percentage: Some(150),
            ..AnalysisQuery::default()
        };
        assert!(query.validate().is_err());
    }
}
