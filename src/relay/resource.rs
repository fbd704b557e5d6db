//! Narrow resource relays.
//!
//! Single-purpose relays to one templated backend path, e.g.
//! `POST /documents/{id}/reindex?tenant_id=..`. Ids are validated before any
//! network call, redirects are not followed, and a backend error of the
//! form `{"detail": "..."}` is rewritten to the relay's error shape.

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::http::response::{json_error, passthrough};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::{copy_credential, read_body, OutboundRequest, RelayError, RelayResult};
use crate::upstream::BackendEndpoint;

/// Query parameter every resource call must carry.
pub const ROUTING_PARAM: &str = "tenant_id";

/// A backend path template with one `{id}` segment.
#[derive(Debug, Clone, Copy)]
pub struct ResourceRoute {
    pub name: &'static str,
    pub template: &'static str,
}

pub const REINDEX: ResourceRoute = ResourceRoute {
    name: "reindex",
    template: "documents/{id}/reindex",
};

pub const STATUS: ResourceRoute = ResourceRoute {
    name: "status",
    template: "documents/{id}/status",
};

impl ResourceRoute {
    /// Expand the template; `id` is percent-encoded as a single segment.
    pub fn target_url(
        &self,
        endpoint: &BackendEndpoint,
        id: &str,
        query: Option<&str>,
    ) -> RelayResult<Url> {
        let mut url = endpoint.url_for("", query)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RelayError::InvalidTarget(format!("{} cannot carry a path", endpoint.authority())))?;
            segments.pop_if_empty();
            for part in self.template.split('/') {
                segments.push(if part == "{id}" { id } else { part });
            }
        }
        Ok(url)
    }
}

/// Fail fast when the routing parameter or the resource id is missing.
pub fn validate(id: &str, query: Option<&str>) -> RelayResult<()> {
    let has_routing = query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .any(|(k, v)| k == ROUTING_PARAM && !v.trim().is_empty())
        })
        .unwrap_or(false);
    if !has_routing {
        return Err(RelayError::missing_field(ROUTING_PARAM));
    }
    if id.trim().is_empty() {
        return Err(RelayError::missing_field("document_id"));
    }
    // `path_segments_mut` drops dot segments, which would shift the template.
    if id == "." || id == ".." {
        return Err(RelayError::Payload {
            message: "Ungültige document_id".to_string(),
        });
    }
    Ok(())
}

/// Rewrite a FastAPI-style `{"detail": "..."}` error into `{error, message}`.
///
/// Anything else passes through unchanged.
pub fn map_error_body(status: StatusCode, content_type: Option<HeaderValue>, body: Bytes) -> Response {
    let detail = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_owned));
    match detail {
        Some(detail) => json_error(status, &detail, &detail),
        None => passthrough(status, content_type, body),
    }
}

/// Relay one resource call.
pub async fn relay_resource(
    state: &AppState,
    route: &ResourceRoute,
    id: &str,
    request: Request<Body>,
) -> RelayResult<Response> {
    let (parts, body) = request.into_parts();
    let query = parts.uri.query();
    validate(id, query)?;

    let url = route.target_url(&state.endpoint, id, query)?;
    let body = read_body(&parts.method, body, state.limits.max_body_bytes).await?;

    let mut headers = HeaderMap::new();
    copy_credential(&parts.headers, &mut headers, &state.credential_header);
    if let Some(content_type) = parts.headers.get(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, content_type.clone());
    }

    let outbound = OutboundRequest::new(parts.method, url, headers, body);
    let envelope = state.dispatcher.send(outbound).await?;

    if envelope.status.is_success() {
        return Ok(envelope.into_streaming_response());
    }

    let status = envelope.status;
    let content_type = envelope.content_type().cloned();
    let body = envelope.bytes().await?;
    tracing::warn!(resource = route.name, id = %id, status = %status, "Backend rejected resource call");
    Ok(map_error_body(status, content_type, body))
}

async fn handle(state: AppState, route: &ResourceRoute, id: String, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let response = match relay_resource(&state, route, &id, request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(resource = route.name, id = %id, kind = e.kind(), error = %e, "Resource relay failed");
            metrics::record_error(e.kind());
            e.into_response()
        }
    };
    metrics::record_request(route.name, &method, response.status().as_u16(), start_time);
    response
}

/// `POST /documents/{id}/reindex`
pub async fn reindex_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Response {
    handle(state, &REINDEX, id, request).await
}

/// `GET /documents/{id}/status`
pub async fn status_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Request<Body>,
) -> Response {
    handle(state, &STATUS, id, request).await
}
