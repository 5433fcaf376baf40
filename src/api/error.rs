use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::{pipeline::PipelineError, savings::RecommenderError};

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Well-formed request the recommender or pipeline cannot work with
    #[error("{0}")]
    Unprocessable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Error response that gets serialized to JSON
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error type string
    fn error_type(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::ValidationError(_) => "ValidationError",
            ApiError::Unprocessable(_) => "Unprocessable",
            ApiError::InternalError(_) => "InternalServerError",
            ApiError::ServiceUnavailable(_) => "ServiceUnavailable",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();

        let message = match &self {
            ApiError::InternalError(_) => {
                tracing::error!(error = %self, "API error occurred");
                "An internal error occurred".to_string()
            }
            ApiError::ServiceUnavailable(_) => {
                tracing::warn!(error = %self, "Service unavailable");
                "Service temporarily unavailable".to_string()
            }
            _ => {
                tracing::debug!(error = %self, "Client error");
                self.to_string()
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(error_response)).into_response()
    }
}

// Conversion from domain error types

impl From<RecommenderError> for ApiError {
    fn from(error: RecommenderError) -> Self {
        match error {
            RecommenderError::InsufficientInput { .. } => {
                ApiError::Unprocessable("insufficient input".to_string())
            }
            RecommenderError::PercentageOutOfRange { .. } => {
                ApiError::ValidationError(error.to_string())
            }
            RecommenderError::UnknownAction(_) => ApiError::BadRequest(error.to_string()),
            RecommenderError::DuplicateAction(_) => ApiError::InternalError(error.to_string()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Ingestion(msg) => ApiError::ServiceUnavailable(msg),
            other => ApiError::InternalError(format!("{}: {}", other.kind(), other)),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::InternalError(error.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unprocessable("test".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::InternalError("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_insufficient_input_maps_to_422() {
        let error: ApiError = RecommenderError::InsufficientInput { kwh: 0.0, cost: 1.0 }.into();
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error.to_string(), "insufficient input");
    }

    #[test]
    fn test_unknown_action_is_bad_request() {
        let error: ApiError = RecommenderError::UnknownAction("solar_roof".into()).into();
        assert_eq!(error.error_type(), "BadRequest");
    }

    #[test]
    fn test_pipeline_errors() {
        let ingestion: ApiError = PipelineError::ingestion("no readings").into();
        assert_eq!(ingestion.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let contract: ApiError = PipelineError::OracleContractViolation {
            expected: 3,
            actual: 2,
        }
        .into();
        assert_eq!(contract.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(contract.to_string().contains("OracleContractViolation"));
    }
}
