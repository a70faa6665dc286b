//! Error types for the analysis service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::processing::JobState;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Analysis service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing request input, caught before any stage runs
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown job id
    #[error("Job not found: {0}")]
    JobNotFound(Uuid),

    /// Upload rejected because of its file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Document or namespace absent from storage
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// The model call itself failed
    #[error("Model provider error: {0}")]
    Provider(String),

    /// The provider refused the request; sending it again will not help
    #[error("Model provider rejected request: {0}")]
    ProviderRejected(String),

    /// The model answered but the text is not the expected shape
    #[error("Malformed {stage} response: {message}")]
    MalformedResponse { stage: &'static str, message: String },

    /// Object store failure other than absence
    #[error("Storage error: {0}")]
    Storage(String),

    /// Illegal job state transition
    #[error("Invalid transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: Uuid,
        from: JobState,
        to: JobState,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    /// Create a malformed response error for a stage
    pub fn malformed(stage: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            stage,
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Transport failures, throttling and provider-side faults
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Provider(_) | Error::Http(_))
    }

    /// True when the error signals an absent document
    pub fn is_document_not_found(&self) -> bool {
        matches!(self, Error::DocumentNotFound(_))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            Error::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "unsupported_file_type"),
            Error::JobNotFound(_) => (StatusCode::NOT_FOUND, "job_not_found"),
            Error::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Provider(_) => (StatusCode::BAD_GATEWAY, "provider_error"),
            Error::ProviderRejected(_) => (StatusCode::BAD_GATEWAY, "provider_rejected"),
            Error::MalformedResponse { .. } => (StatusCode::BAD_GATEWAY, "malformed_response"),
            Error::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            Error::InvalidTransition { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "invalid_transition")
            }
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = Error::validation("missing field").into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = Error::JobNotFound(Uuid::new_v4()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = Error::UnsupportedFileType("notes.docx".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = Error::malformed("stage1", "bad json").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = Error::ProviderRejected("401".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(Error::provider("503").is_retryable());
        assert!(!Error::ProviderRejected("400".to_string()).is_retryable());
        assert!(!Error::malformed("stage2", "x").is_retryable());
        assert!(!Error::validation("x").is_retryable());
    }

    #[test]
    fn test_malformed_message_names_stage() {
        let err = Error::malformed("stage3", "missing field `compliance_status`");
        assert_eq!(
            err.to_string(),
            "Malformed stage3 response: missing field `compliance_status`"
        );
    }
}
