//! Redirect-following dispatcher.
//!
//! # Responsibilities
//! - Send one outbound hop over plain HTTP or TLS, chosen by URL scheme
//! - Follow 3xx responses with a `Location`, bounded by a hop budget
//! - Hand back the terminal response for streaming or buffered parsing
//! - Classify transport failures (network vs. timeout)
//!
//! # Design Decisions
//! - Iterative loop with an explicit budget; hops are strictly sequential
//! - The budget is decremented once per followed redirect, never on the
//!   terminal response
//! - One pooled client per process; no state ties invocations together
//! - Upload and resource relays use the single-shot sends, which never
//!   follow redirects

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use futures_util::TryStreamExt;
use reqwest::multipart::Form;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::TimeoutConfig;
use crate::http::request::X_REQUEST_ID;
use crate::http::response::from_parts;
use crate::observability::metrics;
use crate::relay::descriptor::{is_redirect, OutboundBody, OutboundRequest, RedirectState};
use crate::relay::error::{RelayError, RelayResult};
use crate::relay::headers::response_headers;

/// Terminal output of a dispatch: status, filtered headers, unread body.
#[derive(Debug)]
pub struct ResponseEnvelope {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// The URL that produced this response (after any redirects).
    pub url: Url,
    upstream: reqwest::Response,
}

impl ResponseEnvelope {
    fn new(upstream: reqwest::Response) -> Self {
        Self {
            status: upstream.status(),
            headers: response_headers(upstream.headers()),
            url: upstream.url().clone(),
            upstream,
        }
    }

    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.headers.get(header::CONTENT_TYPE)
    }

    /// Stream mode: bytes are forwarded as they arrive.
    ///
    /// Dropping the returned response (caller went away) drops the upstream
    /// connection with it.
    pub fn into_streaming_response(self) -> Response {
        let url = self.url;
        let stream = self.upstream.bytes_stream().inspect_err(move |e| {
            tracing::warn!(url = %url, error = %e, "Upstream body interrupted mid-stream");
        });
        from_parts(self.status, self.headers, Body::from_stream(stream))
    }

    /// Buffer mode: wait for the complete body.
    pub async fn bytes(self) -> RelayResult<Bytes> {
        self.upstream
            .bytes()
            .await
            .map_err(|e| RelayError::from_transport(&e))
    }

    /// Buffer mode with parsing: 2xx bodies become `T`, anything else
    /// becomes [`RelayError::UpstreamStatus`].
    pub async fn into_document<T: DeserializeOwned>(self) -> RelayResult<T> {
        let status = self.status;
        let body = self.bytes().await?;
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus { status, body });
        }
        serde_json::from_slice(&body).map_err(|e| RelayError::MalformedResponse(e.to_string()))
    }
}

/// Sends outbound hops and chases redirects.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    max_hops: u32,
}

impl Dispatcher {
    /// Build the shared transport.
    pub fn new(timeouts: &TimeoutConfig, max_hops: u32) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .no_proxy()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .read_timeout(Duration::from_secs(timeouts.read_secs))
            .build()?;

        Ok(Self { client, max_hops })
    }

    pub fn max_hops(&self) -> u32 {
        self.max_hops
    }

    /// A full budget for a new top-level invocation.
    pub fn fresh_state(&self) -> RedirectState {
        RedirectState::new(self.max_hops)
    }

    /// Send `request`, following redirects until a terminal response.
    pub async fn dispatch(
        &self,
        request: OutboundRequest,
        state: RedirectState,
    ) -> RelayResult<ResponseEnvelope> {
        let request_id = request_id_of(&request);
        let mut request = request;
        let mut state = state;
        let mut hop = 0u32;

        loop {
            hop += 1;
            tracing::debug!(
                request_id = %request_id,
                hop,
                method = %request.method(),
                url = %request.url(),
                "Dispatching hop"
            );

            let response = self.execute(&request).await?;
            let status = response.status();

            if !is_redirect(status) {
                tracing::debug!(request_id = %request_id, hop, status = %status, "Terminal response");
                return Ok(ResponseEnvelope::new(response));
            }

            let Some(raw_location) = response.headers().get(header::LOCATION) else {
                tracing::error!(request_id = %request_id, hop, status = %status, "Redirect without Location");
                return Err(RelayError::RedirectWithoutTarget { status });
            };
            let location = match raw_location.to_str() {
                Ok(location) => location.to_owned(),
                Err(_) => {
                    tracing::error!(request_id = %request_id, hop, status = %status, "Unreadable Location header");
                    return Err(RelayError::InvalidTarget(format!(
                        "unreadable Location header on {} redirect",
                        status
                    )));
                }
            };

            let Some(next_state) = state.follow() else {
                tracing::error!(
                    request_id = %request_id,
                    hop,
                    max_hops = self.max_hops,
                    "Redirect budget exhausted"
                );
                return Err(RelayError::TooManyRedirects {
                    max_hops: self.max_hops,
                });
            };

            let next = request.redirected(&location, status).map_err(|e| {
                RelayError::InvalidTarget(format!("bad Location '{}': {}", location, e))
            })?;

            tracing::info!(
                request_id = %request_id,
                hop,
                status = %status,
                location = %location,
                remaining_hops = next_state.remaining_hops(),
                "Following redirect"
            );
            metrics::record_redirect();

            drop(response);
            request = next;
            state = next_state;
        }
    }

    /// Single hop, no redirect handling. A 3xx comes back as a terminal response.
    pub async fn send(&self, request: OutboundRequest) -> RelayResult<ResponseEnvelope> {
        tracing::debug!(
            request_id = %request_id_of(&request),
            method = %request.method(),
            url = %request.url(),
            "Sending single-shot request"
        );
        let response = self.execute(&request).await?;
        Ok(ResponseEnvelope::new(response))
    }

    /// Single-shot multipart POST.
    pub async fn send_multipart(
        &self,
        url: Url,
        headers: HeaderMap,
        form: Form,
    ) -> RelayResult<ResponseEnvelope> {
        tracing::debug!(url = %url, "Sending multipart request");
        let response = self
            .client
            .post(url)
            .headers(headers)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RelayError::from_transport(&e))?;
        Ok(ResponseEnvelope::new(response))
    }

    async fn execute(&self, request: &OutboundRequest) -> RelayResult<reqwest::Response> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());

        if let OutboundBody::Bytes(bytes) = request.body() {
            builder = builder.body(bytes.clone());
        }

        builder.send().await.map_err(|e| {
            let err = RelayError::from_transport(&e);
            tracing::warn!(url = %request.url(), error = %e, kind = err.kind(), "Upstream request failed");
            err
        })
    }
}

fn request_id_of(request: &OutboundRequest) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
