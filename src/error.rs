//! Error types and error handling for the application
//!
//! Every failure a tutor operation can produce is classified into one
//! `AppError` variant before it leaves the façade. Transport errors from the
//! model boundary never reach callers unclassified. All errors implement
//! `IntoResponse` to provide consistent error formatting on the HTTP surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// The model client could not be constructed (credential absent)
    #[error("Model client is not configured: {0}")]
    ConfigurationMissing(String),

    /// The remote call did not finish within its time budget
    #[error("The model did not respond within {0} seconds")]
    Timeout(u64),

    /// The remote service rejected the credential
    #[error("The API key was rejected: {0}")]
    InvalidCredential(String),

    /// The remote service reported usage-limit exhaustion
    #[error("Usage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The remote service failed on its side; retrying later may succeed
    #[error("The model service is temporarily unavailable: {0}")]
    ServiceUnavailable(String),

    /// Response text could not be parsed as the expected format
    #[error("The model returned a malformed response: {0}")]
    MalformedResponse(String),

    /// Response parsed but failed shape validation
    #[error("The model response failed validation: {0}")]
    SchemaValidationFailed(String),

    /// Response was blank (e.g. suppressed by safety filtering)
    #[error("The model returned an empty response: {0}")]
    EmptyResponse(String),

    /// Caller-side precondition failed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Activity with the given ID was not found
    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    /// Error occurred during state persistence
    #[error("Persistence error: {0}")]
    Persistence(#[from] crate::state::PersistenceError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable, machine-readable name of the error category
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ConfigurationMissing(_) => "ConfigurationMissing",
            AppError::Timeout(_) => "Timeout",
            AppError::InvalidCredential(_) => "InvalidCredential",
            AppError::QuotaExceeded(_) => "QuotaExceeded",
            AppError::ServiceUnavailable(_) => "ServiceUnavailable",
            AppError::MalformedResponse(_) => "MalformedResponse",
            AppError::SchemaValidationFailed(_) => "SchemaValidationFailed",
            AppError::EmptyResponse(_) => "EmptyResponse",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::ActivityNotFound(_) => "ActivityNotFound",
            AppError::Persistence(_) => "Persistence",
            AppError::Internal(_) => "Internal",
        }
    }

    /// HTTP status used when the error is returned from a handler
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            AppError::ActivityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            AppError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::MalformedResponse(_)
            | AppError::SchemaValidationFailed(_)
            | AppError::EmptyResponse(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) | AppError::ConfigurationMissing(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Persistence(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
