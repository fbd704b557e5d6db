//! Backend relay library.
//!
//! Same-origin gateway in front of a single HTTP backend: generic path
//! relay, typed pre-render loader, multipart upload relays and narrow
//! resource relays, all sharing one redirect-aware dispatcher.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod upstream;

pub use config::schema::RelayConfig;
pub use http::{AppState, RelayServer};
pub use lifecycle::Shutdown;
pub use relay::{LoadOptions, Loader, RelayError};
