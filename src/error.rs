//! Error types for the review-pulse library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application, plus the HTTP mapping
//! used by the transport layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors that can occur in the review-pulse application.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request parameter failed validation
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// General error with context
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Result with ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// HTTP status carried by this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Self::Database(_)
            | Self::Pool(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Config(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the response body
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidParameter(_) => "INVALID_PARAMETER",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Pool(_) => "POOL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, code = self.error_code(), "request failed");
        }

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ApiError::NotFound("Business with ID abc not found".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_invalid_parameter_maps_to_400() {
        let err = ApiError::InvalidParameter("Invalid period: decade".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_storage_errors_map_to_500() {
        let err = ApiError::Database(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "DATABASE_ERROR");

        let err = ApiError::Internal("join failure".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_display_includes_context() {
        let err = ApiError::NotFound("Business with ID abc not found".to_string());
        assert_eq!(err.to_string(), "Not found: Business with ID abc not found");
    }
}
