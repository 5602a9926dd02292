//! API error types and JSON error response formatting.
//!
//! ApiError maps failures on the diagnostics endpoints to HTTP status codes
//! with a JSON body. The chat endpoint never returns one: it always streams.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Present (and false) on endpoints that report a `success` flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Human-readable error message.
    pub error: String,
    /// RFC 3339 time the error was produced.
    pub timestamp: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - unparseable body.
    BadRequest(String),
    /// 500 Internal Server Error - the upstream call failed.
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, success, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, None, msg),
            ApiError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, Some(false), msg),
        };

        let body = ErrorBody {
            success,
            error,
            timestamp: crate::handlers::timestamp(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<zen_chat::ChatError> for ApiError {
    fn from(err: zen_chat::ChatError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}
