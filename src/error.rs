//! Error types for the Dock Health client

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Library-level errors
#[derive(Error, Debug)]
pub enum DockError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A required value (token, identifier, env var) is absent
    #[error("{0}")]
    MissingValue(String),

    /// Input could not be used as given
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a status other than the one expected
    #[error("{method} {url} returned {actual} (expected {expected}): {body}")]
    UnexpectedStatus {
        method: String,
        url: String,
        expected: u16,
        actual: u16,
        body: String,
    },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// OAuth token acquisition failed
    #[error("Token error: {0}")]
    Token(String),

    /// Webhook signature header could not be used
    #[error("Signature error: {0}")]
    Signature(String),

    /// A scenario check did not hold
    #[error("Assertion failed: {0}")]
    Assertion(String),

    /// Callback server failure
    #[error("Server error: {0}")]
    Server(String),
}

impl DockError {
    /// Status code reported by the API, if this error carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            DockError::UnexpectedStatus { actual, .. } => Some(*actual),
            DockError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Error response structure for the callback server
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for DockError {
    fn into_response(self) -> Response {
        let (status_code, status, reason) = match &self {
            DockError::Validation(_) => (StatusCode::BAD_REQUEST, "rejected", "validation_failed"),
            DockError::Signature(_) => (StatusCode::BAD_REQUEST, "rejected", "signature_invalid"),
            DockError::Decode(_) => (StatusCode::BAD_REQUEST, "rejected", "invalid_event"),
            DockError::MissingValue(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "error", "missing_value")
            }
            DockError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                "configuration_error",
            ),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "error", "internal_error"),
        };

        let error_response = ErrorResponse {
            status,
            reason: reason.to_string(),
            details: Some(self.to_string()),
        };

        tracing::error!(
            error_type = %self,
            status_code = %status_code,
            "Callback request error"
        );

        (status_code, Json(json!(error_response))).into_response()
    }
}

/// Result type alias for convenience
pub type DockResult<T> = Result<T, DockError>;
