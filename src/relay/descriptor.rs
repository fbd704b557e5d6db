//! Outbound request descriptors and redirect bookkeeping.
//!
//! An [`OutboundRequest`] describes exactly one hop. Following a redirect
//! never mutates it; [`OutboundRequest::redirected`] builds the next one.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::relay::headers::set_host;

/// Body of an outbound hop.
///
/// Buffered so a redirect can replay it; the response side is what streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutboundBody {
    #[default]
    Empty,
    Bytes(Bytes),
}

impl OutboundBody {
    pub fn is_empty(&self) -> bool {
        match self {
            OutboundBody::Empty => true,
            OutboundBody::Bytes(bytes) => bytes.is_empty(),
        }
    }
}

/// One hop: scheme, host, port, path and query all live in `url`.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    url: Url,
    method: Method,
    headers: HeaderMap,
    body: OutboundBody,
}

impl OutboundRequest {
    /// Build a descriptor. `headers` must already be filtered; `host` is
    /// (re)written from `url`.
    pub fn new(method: Method, url: Url, mut headers: HeaderMap, body: OutboundBody) -> Self {
        set_host(&mut headers, &url);
        Self {
            url,
            method,
            headers,
            body,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &OutboundBody {
        &self.body
    }

    /// Resolve `location` against this hop and build the next descriptor.
    ///
    /// Absolute locations replace scheme, host, port, path and query;
    /// relative ones resolve against this hop's URL. Headers carry forward
    /// with `host` rewritten. A 303 turns the next hop into a bodiless GET.
    pub fn redirected(&self, location: &str, status: StatusCode) -> Result<Self, url::ParseError> {
        let next_url = self.url.join(location)?;

        let (method, body) = if status == StatusCode::SEE_OTHER && self.method != Method::HEAD {
            (Method::GET, OutboundBody::Empty)
        } else {
            (self.method.clone(), self.body.clone())
        };

        Ok(Self::new(method, next_url, self.headers.clone(), body))
    }
}

/// Remaining redirect budget for one top-level invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectState {
    remaining_hops: u32,
}

impl RedirectState {
    /// Fresh budget; every top-level call starts here.
    pub fn new(max_hops: u32) -> Self {
        Self {
            remaining_hops: max_hops,
        }
    }

    pub fn remaining_hops(&self) -> u32 {
        self.remaining_hops
    }

    /// Spend one hop. `None` when the budget is already exhausted.
    pub fn follow(self) -> Option<Self> {
        self.remaining_hops.checked_sub(1).map(|remaining_hops| Self { remaining_hops })
    }
}

/// Whether a terminal-or-redirect decision treats `status` as a redirect.
///
/// 304 Not Modified is a cache validation answer, not a redirect.
pub fn is_redirect(status: StatusCode) -> bool {
    status.is_redirection() && status != StatusCode::NOT_MODIFIED
}
