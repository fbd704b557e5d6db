//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that the backend endpoint can form a URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::config::schema::RelayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let backend = &config.backend;
    if backend.port == 0 {
        errors.push(ValidationError::new("backend.port", "must be non-zero"));
    }
    if backend.cluster_host.trim().is_empty() {
        errors.push(ValidationError::new("backend.cluster_host", "must not be empty"));
    }
    if backend.local_host.trim().is_empty() {
        errors.push(ValidationError::new("backend.local_host", "must not be empty"));
    }
    if backend.scheme != "http" && backend.scheme != "https" {
        errors.push(ValidationError::new(
            "backend.scheme",
            format!("'{}' must be http or https", backend.scheme),
        ));
    }
    if !backend.path_prefix.starts_with('/') || backend.path_prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "backend.path_prefix",
            "must start with '/' and must not end with '/'",
        ));
    }

    let timeouts = &config.timeouts;
    if timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be > 0"));
    }
    if timeouts.read_secs == 0 {
        errors.push(ValidationError::new("timeouts.read_secs", "must be > 0"));
    }
    if timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be > 0"));
    }
    if config.limits.max_upload_bytes == 0 {
        errors.push(ValidationError::new("limits.max_upload_bytes", "must be > 0"));
    }

    if HeaderName::from_bytes(config.credentials.header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "credentials.header",
            format!("'{}' is not a valid header name", config.credentials.header),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&RelayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RelayConfig::default();
        config.backend.port = 0;
        config.backend.scheme = "ftp".into();
        config.backend.path_prefix = "api/v1/".into();
        config.timeouts.read_secs = 0;
        config.credentials.header = "bad header".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "backend.port",
                "backend.scheme",
                "backend.path_prefix",
                "timeouts.read_secs",
                "credentials.header",
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = RelayConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
