//! Generic path relay.
//!
//! `{method} /relay/{path}?{query}` becomes
//! `{method} {scheme}://{host}:{port}{prefix}/{path}?{query}`, redirects are
//! followed, and the terminal response is streamed back.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
};

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::{read_body, OutboundRequest, RelayResult};
use crate::relay::headers::outbound_headers;

/// Inbound mount point of the catch-all relay.
pub const RELAY_PREFIX: &str = "/relay";

/// Catch-all relay handler.
pub async fn relay_path_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = match relay_path(&state, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(method = %method, path = %path, kind = e.kind(), error = %e, "Relay failed");
            metrics::record_error(e.kind());
            e.into_response()
        }
    };

    metrics::record_request("path", &method, response.status().as_u16(), start_time);
    response
}

/// Relay one inbound request and produce the streamed caller response.
pub async fn relay_path(state: &AppState, request: Request<Body>) -> RelayResult<Response> {
    let (parts, body) = request.into_parts();

    // Raw (still percent-encoded) path so it reaches the backend verbatim.
    let inbound_path = parts.uri.path();
    let path = inbound_path.strip_prefix(RELAY_PREFIX).unwrap_or(inbound_path);
    let url = state.endpoint.url_for(path, parts.uri.query())?;

    let body = read_body(&parts.method, body, state.limits.max_body_bytes).await?;
    let headers = outbound_headers(&parts.headers, &url);

    tracing::debug!(method = %parts.method, path = %path, target = %url, "Relaying path");

    let outbound = OutboundRequest::new(parts.method, url, headers, body);
    let envelope = state
        .dispatcher
        .dispatch(outbound, state.dispatcher.fresh_state())
        .await?;

    Ok(envelope.into_streaming_response())
}
