use axum::{
    extract::OriginalUri,
    routing::{get, post},
    Router,
};

use super::{analysis, error::ApiError, health, savings, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::health_check))
        .route("/analysis", get(analysis::get_analysis))
        .route("/savings/actions", get(savings::list_actions))
        .route("/savings/interactive", post(savings::interactive))
        .route("/savings/action-plan", post(savings::action_plan))
        .fallback(not_found)
        .with_state(state)
}

/// Nested routers see a stripped path, so report the one the client sent.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
