//! Error types for the analyze endpoint and its external collaborators.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// A candidate analysis that does not match the response contract.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("schema violation at `{field}`: {reason}")]
pub struct SchemaViolation {
    pub field: String,
    pub reason: String,
}

impl SchemaViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of an outbound reasoning or generation call.
#[derive(Error, Debug)]
pub enum ExternalCallError {
    /// The provider API or the transport to it failed.
    #[error("provider API error: {0}")]
    Api(String),

    #[error("external call failed: {0}")]
    Other(String),
}

/// Request-level error taxonomy. Each variant maps to one HTTP status.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("server configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("external service unavailable")]
    ExternalServiceUnavailable,

    #[error(transparent)]
    SchemaViolation(#[from] SchemaViolation),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ExternalCallError> for AnalyzeError {
    fn from(e: ExternalCallError) -> Self {
        match e {
            ExternalCallError::Api(_) => AnalyzeError::ExternalServiceUnavailable,
            ExternalCallError::Other(msg) => AnalyzeError::Internal(msg),
        }
    }
}

impl AnalyzeError {
    pub fn status(&self) -> StatusCode {
        match self {
            AnalyzeError::ConfigurationMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AnalyzeError::Unauthorized => StatusCode::UNAUTHORIZED,
            AnalyzeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnalyzeError::ExternalServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AnalyzeError::SchemaViolation(_) | AnalyzeError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AnalyzeError::ConfigurationMissing(_) => "configuration_missing",
            AnalyzeError::Unauthorized => "unauthorized",
            AnalyzeError::InvalidInput(_) => "invalid_input",
            AnalyzeError::ExternalServiceUnavailable => "service_unavailable",
            AnalyzeError::SchemaViolation(_) => "invalid_analysis",
            AnalyzeError::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to the caller. Server-side details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AnalyzeError::ConfigurationMissing(_) => "Server is not configured".to_string(),
            AnalyzeError::Unauthorized => "Invalid or missing secret".to_string(),
            AnalyzeError::InvalidInput(msg) => msg.clone(),
            AnalyzeError::ExternalServiceUnavailable => {
                "Analysis service is temporarily unavailable".to_string()
            }
            AnalyzeError::SchemaViolation(_) => "Analysis produced an invalid result".to_string(),
            AnalyzeError::Internal(_) => "Failed to analyze content".to_string(),
        }
    }
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "Request failed: {}", self);
        }
        let body = json!({
            "error": self.code(),
            "message": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_failures_map_to_unavailable() {
        let err: AnalyzeError = ExternalCallError::Api("502 from upstream".into()).into();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err: AnalyzeError = ExternalCallError::Other("bad json".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn server_errors_hide_details() {
        let err = AnalyzeError::Internal("upstream said: secret stack".into());
        assert_eq!(err.public_message(), "Failed to analyze content");

        let err = AnalyzeError::ConfigurationMissing("ANALYZE_SECRET");
        assert!(!err.public_message().contains("ANALYZE_SECRET"));
    }
}
