use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use super::{error::ApiError, response::ApiResponse, AppState};
use crate::savings::{ActionPlan, InvoiceInput, SavingAction, SavingsProjection};

#[derive(Debug, Deserialize, Validate)]
pub struct InteractiveRequest {
    pub kwh: f64,
    pub cost: f64,
    #[validate(range(min = 1, max = 100))]
    pub percentage: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActionPlanRequest {
    pub kwh: f64,
    pub cost: f64,
    #[validate(length(max = 64))]
    #[serde(default)]
    pub actions: Vec<String>,
}

/// GET /api/v1/savings/actions - Saving action catalogue
pub async fn list_actions(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SavingAction>>>, ApiError> {
    let actions = state.pipeline.recommender().catalogue().actions().to_vec();
    let count = actions.len();
    Ok(Json(ApiResponse::success(actions).with_count(count)))
}

/// POST /api/v1/savings/interactive - Projection for a chosen percentage
pub async fn interactive(
    State(state): State<AppState>,
    Json(req): Json<InteractiveRequest>,
) -> Result<Json<ApiResponse<SavingsProjection>>, ApiError> {
    let invoice = InvoiceInput::new(req.kwh, req.cost);
    // invoice figures are checked before the percentage
    invoice.unit_price()?;
    req.validate()?;

    let projection = state
        .pipeline
        .recommender()
        .interactive(&invoice, req.percentage)?;
    Ok(Json(ApiResponse::success(projection)))
}

/// POST /api/v1/savings/action-plan - Projection for a set of actions
pub async fn action_plan(
    State(state): State<AppState>,
    Json(req): Json<ActionPlanRequest>,
) -> Result<Json<ApiResponse<ActionPlan>>, ApiError> {
    req.validate()?;

    let invoice = InvoiceInput::new(req.kwh, req.cost);
    let plan = state
        .pipeline
        .recommender()
        .action_plan(&invoice, &req.actions)?;
    if plan.exceeds_consumption {
        tracing::warn!(
            total_percent = plan.total_percent,
            "selected actions promise more than total consumption"
        );
    }
    Ok(Json(ApiResponse::success(plan)))
}
