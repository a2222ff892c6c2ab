//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; failures become the
//! plain-text bodies clients of `/fetch` expect.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rarstream_common::Error;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: Error,
}

impl AppError {
    pub fn new(inner: Error) -> Self {
        Self { inner }
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = match &self.inner {
            Error::Validation(reason) => {
                tracing::debug!("Rejected fetch request: {reason}");
                "Invalid or missing .rar URL.".to_string()
            }
            Error::NotFound(message) => message.clone(),
            Error::Download { message, .. } | Error::Extraction { message, .. } => {
                format!("Failed to download or extract RAR file: {message}")
            }
            other => format!("Failed to download or extract RAR file: {other}"),
        };

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in fetch handler"
            );
        }

        (status, body).into_response()
    }
}
