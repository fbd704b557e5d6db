//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (path, method, headers, query, body)
//!     → path.rs      (catch-all: /relay/{*path})
//!     → upload.rs    (multipart decode → validate → re-encode)
//!     → resource.rs  (validate ids → templated backend path)
//!     → descriptor.rs (OutboundRequest, one per hop)
//!     → dispatcher.rs (send; follow 3xx within RedirectState budget)
//!     → ResponseEnvelope
//!         → streamed back to the caller (path, resource)
//!         → buffered and parsed (loader.rs) or relayed verbatim (upload.rs)
//! ```
//!
//! # Design Decisions
//! - Validation happens before any network call
//! - Every invocation owns its descriptor and hop budget; nothing is shared
//!   except the resolved endpoint and the pooled transport
//! - Hop-specific headers never cross a hop in either direction
//! - No retries; redirect-following is bounded protocol compliance

pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod headers;
pub mod loader;
pub mod path;
pub mod resource;
pub mod upload;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, HeaderName, Method};
use http_body_util::LengthLimitError;

pub use descriptor::{OutboundBody, OutboundRequest, RedirectState};
pub use dispatcher::{Dispatcher, ResponseEnvelope};
pub use error::{RelayError, RelayResult};
pub use loader::{LoadOptions, Loader};

/// GET and HEAD never forward a body.
pub fn carries_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}

/// Buffer an inbound body up to `limit` bytes.
///
/// Over the limit is `BodyTooLarge` (413); any other read failure is
/// `InboundBody` (400).
pub async fn read_body(method: &Method, body: Body, limit: usize) -> RelayResult<OutboundBody> {
    if !carries_body(method) {
        return Ok(OutboundBody::Empty);
    }
    let bytes = to_bytes(body, limit).await.map_err(|e| {
        if exceeds_limit(&e) {
            RelayError::BodyTooLarge { limit }
        } else {
            RelayError::InboundBody(e.to_string())
        }
    })?;
    if bytes.is_empty() {
        Ok(OutboundBody::Empty)
    } else {
        Ok(OutboundBody::Bytes(bytes))
    }
}

fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Copy the credential header (and request id) from `inbound` into `outbound`.
///
/// The relay never invents a credential; a missing header stays missing.
pub fn copy_credential(inbound: &HeaderMap, outbound: &mut HeaderMap, credential: &HeaderName) {
    if let Some(value) = inbound.get(credential) {
        outbound.insert(credential.clone(), value.clone());
    }
    if let Some(value) = inbound.get(crate::http::request::X_REQUEST_ID) {
        outbound.insert(crate::http::request::X_REQUEST_ID, value.clone());
    }
}
