//! Error responses
//!
//! Maps `StoreError` onto HTTP status codes and short plain-text bodies.
//! Internal details (paths, OS errors) go to the log, never to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::StoreError;

impl StoreError {
    /// Body text sent to clients
    fn client_message(&self) -> &'static str {
        match self {
            StoreError::InvalidKey { .. } => "invalid object key",
            StoreError::Conflict { .. } => "object already exists",
            StoreError::NotFound { .. } => "object not found",
            _ => "internal error",
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.is_client_error() {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        } else {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }

        (status, format!("{}\n", self.client_message())).into_response()
    }
}
