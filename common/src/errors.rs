//! Error types shared across the service.
//!
//! Every failure is terminal for the current request and surfaces to the
//! caller as a short machine-readable status string in the response body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application error kinds.
#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown alias, metric not allowed for the alias, or metric missing
    /// from the catalog.
    #[error("alias or metric not found")]
    NotFound,

    /// Request path could not be parsed into an alias. Router matching
    /// never delivers such a path to a handler, but the variant stays so
    /// the error surface covers every documented failure kind.
    #[error("malformed request path")]
    BadRequest,

    /// Opening a connection or the liveness probe failed.
    #[error("database connection failed: {0}")]
    ConnectionRefused(String),

    /// The driver rejected the query at execution time.
    #[error("query execution failed: {0}")]
    Sql(String),

    /// Encoding the result set failed.
    #[error("response encoding failed: {0}")]
    Serialization(String),

    /// The catalog names a driver this build does not provide.
    #[error("unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// The catalog file could not be read, parsed, or validated.
    #[error("catalog error: {0}")]
    Catalog(String),
}

impl AppError {
    /// Machine-readable status code reported in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "NOT_FOUND",
            AppError::BadRequest => "BAD_REQUEST",
            AppError::ConnectionRefused(_) => "ECONNREFUSED",
            AppError::Sql(_) => "SQL_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::UnsupportedDriver(_) => "UNSUPPORTED_DRIVER",
            AppError::Catalog(_) => "CATALOG_ERROR",
        }
    }

    /// HTTP status the error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), self.code()).into_response()
    }
}
