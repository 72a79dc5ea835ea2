//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`sc_core::Error`] so that route handlers
//! can return `Result<T, AppError>` and have failures rendered as
//! `{"error": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(inner: sc_core::Error) -> Self {
        let status = StatusCode::from_u16(inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            message: inner.to_string(),
        }
    }

    /// A pipeline failure on the upload endpoint. Always a 500, whatever
    /// the underlying cause.
    pub fn conversion_failed(cause: &sc_core::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("conversion failed: {cause}"),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<sc_core::Error> for AppError {
    fn from(e: sc_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                error = %self.message,
                "Server error in API handler"
            );
        }

        (self.status, axum::Json(json!({ "error": self.message }))).into_response()
    }
}
