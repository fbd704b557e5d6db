//! Response handling and transformation.
//!
//! # Responsibilities
//! - Build the JSON error body every relay-level failure uses
//! - Turn a backend response into a caller response
//! - Keep hop-specific headers out of what the caller sees
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the entire body
//! - Error bodies expose only a category and a message, never backend topology

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Error body returned for relay-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Build a JSON error response.
pub fn json_error(status: StatusCode, error: &str, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

/// Build a buffered response carrying a backend status and body unchanged.
///
/// `content_type` is the backend's, when known.
pub fn passthrough(status: StatusCode, content_type: Option<HeaderValue>, body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    let content_type = content_type
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));
    response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    response
}

/// Build a response from already-filtered parts and a (possibly streaming) body.
pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
