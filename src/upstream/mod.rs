//! Upstream endpoint subsystem.
//!
//! # Data Flow
//! ```text
//! BackendConfig (containerized flag injected at startup)
//!     → endpoint.rs (resolve_backend)
//!     → BackendEndpoint (immutable, shared via Arc)
//!     → every relay builds outbound URLs from it
//! ```
//!
//! # Design Decisions
//! - Resolved once per process; relays stay environment-agnostic
//! - No failure mode: validation already rejected unusable settings

pub mod endpoint;

pub use endpoint::{resolve_backend, BackendEndpoint};
