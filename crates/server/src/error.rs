//! Unified error handling for the HTTP surface.
//!
//! Every failure leaves the server as a stable JSON envelope:
//! `{"error", "message", "code", "timestamp"}`. The `code` is a stable
//! machine-readable string per failure class; `message` is safe for clients,
//! with internal detail kept in logs and Sentry.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::json;

/// Application-level error carried out of route handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// 500 with internal detail logged and sent to Sentry, never to clients.
    pub fn internal<E: std::error::Error>(code: &'static str, err: &E) -> Self {
        let event_id = sentry::capture_error(err);
        tracing::error!(error = %err, code, sentry_event_id = %event_id, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code,
            message: "Internal server error".to_string(),
        }
    }

    /// 502 for upstream (commerce backend, embeddings, index) failures.
    pub fn bad_gateway<E: std::error::Error>(code: &'static str, err: &E) -> Self {
        let event_id = sentry::capture_error(err);
        tracing::error!(error = %err, code, sentry_event_id = %event_id, "upstream failed");
        Self {
            status: StatusCode::BAD_GATEWAY,
            code,
            message: "External service error".to_string(),
        }
    }

    #[must_use]
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.status.canonical_reason().unwrap_or("Error"),
            "message": self.message,
            "code": self.code,
            "timestamp": Utc::now().to_rfc3339(),
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_shape() {
        let err = ApiError::not_found("PRODUCT_NOT_FOUND", "Product 42 not found");
        assert_eq!(err.code(), "PRODUCT_NOT_FOUND");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_status() {
        let err = ApiError::conflict("SYNC_IN_PROGRESS", "A sync is already in progress");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
