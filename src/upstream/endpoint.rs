//! Backend endpoint abstraction.
//!
//! # Responsibilities
//! - Decide which host name addresses the backend (cluster vs. loopback)
//! - Build outbound URLs from a relative path and optional query

use url::Url;

use crate::config::BackendConfig;
use crate::relay::RelayError;

/// The single backend the relay talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Fixed prefix, e.g. "/api/v1".
    pub path_prefix: String,
}

/// Resolve the backend from configuration.
///
/// Pure: `containerized` is the only input that changes the host.
pub fn resolve_backend(config: &BackendConfig) -> BackendEndpoint {
    let host = if config.containerized {
        &config.cluster_host
    } else {
        &config.local_host
    };

    BackendEndpoint {
        scheme: config.scheme.clone(),
        host: host.clone(),
        port: config.port,
        path_prefix: config.path_prefix.trim_end_matches('/').to_string(),
    }
}

impl BackendEndpoint {
    /// `host:port` as sent in the `host` header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build `scheme://host:port{prefix}/{path}?{query}`.
    ///
    /// Leading slashes on `path` are collapsed so callers can pass either
    /// "tenants" or "/tenants". Dot segments, raw or percent-encoded, are
    /// rejected: the URL parser would resolve them and climb out of the prefix.
    pub fn url_for(&self, path: &str, query: Option<&str>) -> Result<Url, RelayError> {
        if has_dot_segment(path) {
            return Err(RelayError::Payload {
                message: "Ungültiger Pfad".to_string(),
            });
        }

        let mut target = format!(
            "{}://{}{}/{}",
            self.scheme,
            self.authority(),
            self.path_prefix,
            path.trim_start_matches('/')
        );
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(query);
        }
        let url = Url::parse(&target)
            .map_err(|e| RelayError::InvalidTarget(format!("{}: {}", target, e)))?;

        if !url.path().starts_with(&self.path_prefix) {
            return Err(RelayError::InvalidTarget(format!("{} escapes {}", url, self.path_prefix)));
        }
        Ok(url)
    }
}

/// True when any segment is `.` or `..`, counting `%2e` (any case) as a dot.
///
/// Backslashes separate segments too: the URL parser treats them as `/`
/// for http(s).
fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
        decoded == "." || decoded == ".."
    })
}
