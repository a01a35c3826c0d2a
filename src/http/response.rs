//! Fixed response payloads.
//!
//! Every payload produced by the server itself (rather than by an endpoint)
//! is a JSON object with `error`, `message` and `timestamp`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::any::Any;

use crate::http::server::MAX_BODY_BYTES;

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// No route for this (method, path).
pub fn not_found(method: &str, original_uri: &str, path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("Route {} {} not found", method, original_uri),
            "method": method,
            "path": path,
            "timestamp": timestamp(),
        })),
    )
        .into_response()
}

/// A failure while producing a matched endpoint's response.
pub fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Internal Server Error",
            "message": message,
            "timestamp": timestamp(),
        })),
    )
        .into_response()
}

/// The request itself could not be decoded.
pub fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "Bad Request",
            "message": message,
            "timestamp": timestamp(),
        })),
    )
        .into_response()
}

/// A streamed request body ran past the size limit.
pub fn payload_too_large() -> Response {
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(json!({
            "error": "Payload Too Large",
            "message": format!("Request body exceeds {} bytes", MAX_BODY_BYTES),
            "timestamp": timestamp(),
        })),
    )
        .into_response()
}

/// Convert a panic caught at the service boundary into a 500 payload.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };

    tracing::error!(error = %message, "Request handler panicked");
    internal_error(&message)
}
