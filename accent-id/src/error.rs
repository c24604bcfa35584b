//! Error types for accent-id
//!
//! Every handler failure is rendered as JSON with a `detail` message.
//! Classification and IO failures log their full cause and return a fixed
//! detail, so staged paths and decoder internals stay server side.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Detail sent for failures whose cause is only logged
pub const INTERNAL_ERROR_DETAIL: &str = "Internal Server Error";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or oversized multipart body (status chosen by axum)
    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// Request carried no file field (422)
    #[error("Missing file field: {0}")]
    MissingFile(String),

    /// Loaded model has no entry for the requested label (500)
    #[error("{0}")]
    LabelNotFound(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Classifier failed on the staged upload (500)
    #[error("Classification failed: {0:#}")]
    Classification(anyhow::Error),

    /// Classification exceeded the configured bound (504)
    #[error("Classification timed out after {0:?}")]
    Timeout(Duration),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status and stable error code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Multipart(e) => (e.status(), "BAD_MULTIPART"),
            ApiError::MissingFile(_) => (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_FILE"),
            ApiError::LabelNotFound(_) | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            ApiError::Classification(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CLASSIFICATION_ERROR")
            }
            ApiError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }

    /// Message returned to the client
    pub fn detail(&self) -> String {
        match self {
            ApiError::Classification(_) | ApiError::Io(_) => INTERNAL_ERROR_DETAIL.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, "{}", self);
        } else {
            tracing::warn!(code = error_code, "{}", self);
        }

        let body = Json(json!({
            "detail": self.detail(),
            "code": error_code,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
