//! Pre-render data loader.
//!
//! Same dispatch and redirect behaviour as the path relay, but the terminal
//! body is buffered and parsed into a typed value. Callers that decide what
//! to render need the value, not a stream.

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue, Method};
use serde::de::DeserializeOwned;

use crate::relay::headers::outbound_headers;
use crate::relay::{Dispatcher, OutboundBody, OutboundRequest, RelayResult};
use crate::upstream::BackendEndpoint;

/// Per-call options; defaults to a plain GET.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub method: Option<Method>,
    pub headers: HeaderMap,
}

impl LoadOptions {
    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Buffered JSON loader over the redirect-following dispatcher.
#[derive(Debug, Clone)]
pub struct Loader {
    dispatcher: Dispatcher,
    endpoint: Arc<BackendEndpoint>,
}

impl Loader {
    pub fn new(dispatcher: Dispatcher, endpoint: Arc<BackendEndpoint>) -> Self {
        Self {
            dispatcher,
            endpoint,
        }
    }

    /// Load `path` (relative to the backend prefix, may carry a query) as `T`.
    ///
    /// Non-2xx terminal responses reject with `UpstreamStatus`; bodies that
    /// fail to parse reject with `MalformedResponse`.
    pub async fn load<T: DeserializeOwned>(&self, path: &str, options: LoadOptions) -> RelayResult<T> {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };
        let url = self.endpoint.url_for(path, query)?;

        let mut headers = outbound_headers(&options.headers, &url);
        headers
            .entry(header::ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));

        let method = options.method.unwrap_or(Method::GET);
        tracing::debug!(method = %method, target = %url, "Loading document");

        let request = OutboundRequest::new(method, url, headers, OutboundBody::Empty);
        let envelope = self
            .dispatcher
            .dispatch(request, self.dispatcher.fresh_state())
            .await?;

        let status = envelope.status;
        envelope.into_document::<T>().await.inspect_err(|e| {
            tracing::warn!(path = %path, status = %status, kind = e.kind(), error = %e, "Load rejected");
        })
    }
}
