use thiserror::Error;

/// Failures that abort an analysis run.
///
/// Degenerate scaling is not listed: the scaler falls back to a constant and
/// the run continues.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Oracle contract violation: expected {expected} predictions, got {actual}")]
    OracleContractViolation { expected: usize, actual: usize },

    #[error("Oracle failure: {0}")]
    Oracle(#[source] anyhow::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl PipelineError {
    pub fn ingestion(message: impl Into<String>) -> Self {
        PipelineError::Ingestion(message.into())
    }

    /// Stable machine-readable kind, used in logs and API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Ingestion(_) => "IngestionError",
            PipelineError::OracleContractViolation { .. } => "OracleContractViolation",
            PipelineError::Oracle(_) => "OracleFailure",
            PipelineError::Configuration(_) => "ConfigurationError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::OracleContractViolation {
            expected: 10,
            actual: 9,
        };
        assert_eq!(
            err.to_string(),
            "Oracle contract violation: expected 10 predictions, got 9"
        );
        assert_eq!(err.kind(), "OracleContractViolation");
    }

    #[test]
    fn test_ingestion_helper() {
        let err = PipelineError::ingestion("no readings");
        assert_eq!(err.to_string(), "Ingestion error: no readings");
        assert_eq!(err.kind(), "IngestionError");
    }
}
