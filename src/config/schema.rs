//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the backend relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend host selection and fixed path prefix.
    pub backend: BackendConfig,

    /// Timeout configuration for outbound hops.
    pub timeouts: TimeoutConfig,

    /// Redirect-following settings.
    pub redirects: RedirectConfig,

    /// Body size limits.
    pub limits: LimitsConfig,

    /// Credential propagation settings.
    pub credentials: CredentialConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Backend endpoint configuration.
///
/// `containerized` picks between the in-cluster service name and the
/// loopback name; everything else is shared by both.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Running inside the container network (overridden by `RELAY_CONTAINERIZED`).
    pub containerized: bool,

    /// Symbolic host name of the backend inside the cluster.
    pub cluster_host: String,

    /// Host name used when running outside the cluster.
    pub local_host: String,

    /// Backend port.
    pub port: u16,

    /// "http" or "https".
    pub scheme: String,

    /// Fixed path prefix every outbound request starts with.
    pub path_prefix: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            containerized: false,
            cluster_host: "backend".to_string(),
            local_host: "localhost".to_string(),
            port: 8000,
            scheme: "http".to_string(),
            path_prefix: "/api/v1".to_string(),
        }
    }
}

/// Timeout configuration for outbound hops.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Idle read timeout per hop in seconds.
    pub read_secs: u64,

    /// Inbound deadline until response headers are produced, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            read_secs: 30,
            request_secs: 60,
        }
    }
}

/// Redirect-following configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Maximum number of redirects followed per top-level request.
    pub max_hops: u32,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self { max_hops: 5 }
    }
}

/// Inbound body limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered body for the path and resource relays.
    pub max_body_bytes: usize,

    /// Maximum multipart body accepted by the upload relays.
    pub max_upload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024,   // 2MB
            max_upload_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Credential propagation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Header carried unchanged from inbound to outbound requests.
    pub header: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            header: "x-api-key".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
