//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → RELAY_CONTAINERIZED env flag (read once, here)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → injected into the server and dispatcher at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Request handling never reads the environment

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::BackendConfig;
pub use schema::ListenerConfig;
pub use schema::RelayConfig;
pub use schema::TimeoutConfig;
