//! Header manipulation across hops.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers (RFC 7230 §6.1) in both directions
//! - Strip hop-specific routing headers (`location`, `refresh`)
//! - Rewrite `host` to the hop's authority instead of copying it
//!
//! # Design Decisions
//! - One list drives both directions
//! - `content-length` is dropped outbound only; the transport recomputes it

use std::sync::LazyLock;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use url::Url;

static HOP_SPECIFIC: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "proxy-connection",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authenticate",
        "proxy-authorization",
        "location",
        "refresh",
        "host",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// True when `name` must never cross a hop.
pub fn is_hop_specific(name: &HeaderName) -> bool {
    HOP_SPECIFIC.contains(name)
}

/// Remove every hop-specific header in place.
pub fn strip_hop_specific(headers: &mut HeaderMap) {
    for name in HOP_SPECIFIC.iter() {
        headers.remove(name);
    }
}

/// Headers for an outbound hop: inbound minus hop-specific, `host` set to `target`.
pub fn outbound_headers(inbound: &HeaderMap, target: &Url) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_specific(&mut headers);
    headers.remove(header::CONTENT_LENGTH);
    set_host(&mut headers, target);
    headers
}

/// Point `host` at the authority of `target`.
pub fn set_host(headers: &mut HeaderMap, target: &Url) {
    let Some(host) = target.host_str() else {
        headers.remove(header::HOST);
        return;
    };
    let value = target
        .port()
        .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
    match HeaderValue::from_str(&value) {
        Ok(value) => {
            headers.insert(header::HOST, value);
        }
        Err(_) => {
            headers.remove(header::HOST);
        }
    }
}

/// Headers returned to the caller: backend response minus hop-specific ones.
pub fn response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    strip_hop_specific(&mut headers);
    headers
}
