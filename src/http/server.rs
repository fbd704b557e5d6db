//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with every relay handler
//! - Wire up middleware (tracing, request ID, timeout, body limits)
//! - Build the shared state (dispatcher, resolved endpoint)
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::InvalidHeaderName, HeaderName},
    routing::{any, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::LimitsConfig;
use crate::config::RelayConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::signals::shutdown_signal;
use crate::relay::path::relay_path_handler;
use crate::relay::resource::{reindex_handler, status_handler};
use crate::relay::upload::{csv_upload_handler, text_upload_handler};
use crate::relay::{Dispatcher, Loader};
use crate::upstream::{resolve_backend, BackendEndpoint};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub endpoint: Arc<BackendEndpoint>,
    pub credential_header: HeaderName,
    pub limits: LimitsConfig,
}

impl AppState {
    /// Build state from validated configuration.
    pub fn from_config(config: &RelayConfig) -> Result<Self, ServerError> {
        let dispatcher = Dispatcher::new(&config.timeouts, config.redirects.max_hops)
            .map_err(ServerError::Transport)?;
        let credential_header = HeaderName::from_bytes(config.credentials.header.as_bytes())
            .map_err(ServerError::CredentialHeader)?;

        Ok(Self {
            dispatcher,
            endpoint: Arc::new(resolve_backend(&config.backend)),
            credential_header,
            limits: config.limits.clone(),
        })
    }

    /// Buffered loader sharing this state's transport and endpoint.
    pub fn loader(&self) -> Loader {
        Loader::new(self.dispatcher.clone(), self.endpoint.clone())
    }
}

/// Errors building the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Transport(reqwest::Error),

    #[error("invalid credential header name: {0}")]
    CredentialHeader(InvalidHeaderName),
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
}

impl RelayServer {
    /// Create a new relay server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;

        tracing::info!(
            backend = %state.endpoint.authority(),
            path_prefix = %state.endpoint.path_prefix,
            containerized = config.backend.containerized,
            max_hops = config.redirects.max_hops,
            "Backend resolved"
        );

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let upload_limit = config.limits.max_upload_bytes;

        Router::new()
            .route("/healthz", get(health))
            .route("/relay", any(relay_path_handler))
            .route("/relay/{*path}", any(relay_path_handler))
            .route("/upload/csv", post(csv_upload_handler).layer(DefaultBodyLimit::max(upload_limit)))
            .route("/upload/text", post(text_upload_handler).layer(DefaultBodyLimit::max(upload_limit)))
            .route("/documents/{id}/reindex", post(reindex_handler))
            .route("/documents/{id}/status", get(status_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// The router, for embedding or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_healthz_and_request_id() {
        let server = RelayServer::new(RelayConfig::default()).unwrap();
        let response = server
            .router()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_inbound_request_id_is_kept() {
        let server = RelayServer::new(RelayConfig::default()).unwrap();
        let response = server
            .router()
            .oneshot(
                Request::get("/healthz")
                    .header("x-request-id", "caller-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "caller-42");
    }

    #[tokio::test]
    async fn test_state_uses_configured_credential_header() {
        let mut config = RelayConfig::default();
        config.credentials.header = "X-Tenant-Key".into();
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.credential_header.as_str(), "x-tenant-key");
    }

    #[tokio::test]
    async fn test_invalid_credential_header_rejected() {
        let mut config = RelayConfig::default();
        config.credentials.header = "bad header".into();
        assert!(matches!(
            AppState::from_config(&config),
            Err(ServerError::CredentialHeader(_))
        ));
    }
}
