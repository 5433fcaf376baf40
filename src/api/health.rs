use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    meter_feed: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(latency_ms: u64) -> Self {
        Self {
            status: "healthy".to_string(),
            latency_ms: Some(latency_ms),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: "unhealthy".to_string(),
            latency_ms: None,
            error: Some(error),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// GET /api/v1/healthz
///
/// Reports `degraded` (503) when the configured meter feed cannot be read,
/// since `/analysis` would fail.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let meter_feed = check_meter_feed(&state).await;
    let healthy = meter_feed.is_healthy();

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now(),
        checks: HealthChecks { meter_feed },
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    tracing::debug!(healthy, "Health check completed");

    (status_code, Json(response))
}

async fn check_meter_feed(state: &AppState) -> ComponentHealth {
    let start = Instant::now();
    match tokio::fs::metadata(&state.feed_path).await {
        Ok(meta) if meta.is_file() => ComponentHealth::healthy(start.elapsed().as_millis() as u64),
        Ok(_) => ComponentHealth::unhealthy(format!("{} is not a file", state.feed_path.display())),
        Err(e) => ComponentHealth::unhealthy(format!("{}: {}", state.feed_path.display(), e)),
    }
}
