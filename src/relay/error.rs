//! Relay error taxonomy.
//!
//! Every failure a relay can hit is one of these variants. Each carries
//! what the caller needs to build a user-facing message, and the
//! `IntoResponse` impl is the single translation step to HTTP.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::response::{json_error, passthrough};

/// Errors produced while relaying a request to the backend.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Connection failed, timed out, or broke mid-transfer.
    #[error("backend unreachable: {message}")]
    Network { message: String, timed_out: bool },

    /// A 3xx without a `Location` header.
    #[error("redirect without target (status {status})")]
    RedirectWithoutTarget { status: StatusCode },

    /// Hop budget exhausted.
    #[error("too many redirects (limit {max_hops})")]
    TooManyRedirects { max_hops: u32 },

    /// Non-2xx terminal response where the caller needed a success.
    #[error("backend responded with status {status}")]
    UpstreamStatus { status: StatusCode, body: Bytes },

    /// Terminal 2xx body did not parse as the expected document.
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// Inbound request is missing a required field or file.
    #[error("{message}")]
    Payload { message: String },

    /// Inbound body could not be read.
    #[error("invalid request body: {0}")]
    InboundBody(String),

    /// Inbound body exceeded the configured limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Outbound URL could not be built.
    #[error("invalid backend target: {0}")]
    InvalidTarget(String),
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    /// Missing-field error with the presentation tier's wording.
    pub fn missing_field(field: &str) -> Self {
        RelayError::Payload {
            message: format!("{} ist erforderlich", field),
        }
    }

    /// Classify a transport failure.
    ///
    /// The message is fixed; reqwest's text names the backend URL. Log the
    /// original error where it happens.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let timed_out = err.is_timeout();
        let message = if timed_out {
            "backend timed out"
        } else {
            "backend unreachable"
        };
        RelayError::Network {
            message: message.to_string(),
            timed_out,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Network { timed_out: true, .. } => "timeout",
            RelayError::Network { .. } => "network",
            RelayError::RedirectWithoutTarget { .. } => "redirect_without_target",
            RelayError::TooManyRedirects { .. } => "too_many_redirects",
            RelayError::UpstreamStatus { .. } => "upstream_status",
            RelayError::MalformedResponse(_) => "malformed_response",
            RelayError::Payload { .. } => "payload",
            RelayError::InboundBody(_) => "inbound_body",
            RelayError::BodyTooLarge { .. } => "body_too_large",
            RelayError::InvalidTarget(_) => "invalid_target",
        }
    }

    /// HTTP status the caller sees for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Network { timed_out: true, .. } => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Network { .. } => StatusCode::BAD_GATEWAY,
            RelayError::RedirectWithoutTarget { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::TooManyRedirects { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::UpstreamStatus { status, .. } => *status,
            RelayError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            RelayError::Payload { .. } => StatusCode::BAD_REQUEST,
            RelayError::InboundBody(_) => StatusCode::BAD_REQUEST,
            RelayError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::InvalidTarget(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            RelayError::UpstreamStatus { status, body } => passthrough(status, None, body),
            RelayError::Network { timed_out: true, message } => {
                json_error(status, "gateway timeout", &message)
            }
            RelayError::Network { message, .. } => json_error(status, "bad gateway", &message),
            RelayError::RedirectWithoutTarget { .. } => json_error(
                status,
                "redirect without target",
                "backend sent a redirect without a Location header",
            ),
            RelayError::TooManyRedirects { max_hops } => json_error(
                status,
                "too many redirects",
                &format!("backend redirected more than {} times", max_hops),
            ),
            RelayError::MalformedResponse(message) => {
                json_error(status, "malformed response", &message)
            }
            RelayError::Payload { message } => json_error(status, &message, &message),
            RelayError::InboundBody(message) => json_error(status, "invalid request body", &message),
            RelayError::BodyTooLarge { limit } => json_error(
                status,
                "payload too large",
                &format!("request body exceeds {} bytes", limit),
            ),
            RelayError::InvalidTarget(_) => json_error(
                status,
                "invalid backend target",
                "could not build the backend request",
            ),
        }
    }
}
