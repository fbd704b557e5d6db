//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, routes, middleware)
//!     → request.rs (assign / keep x-request-id)
//!     → relay handlers (path, upload, resource)
//!     → response.rs (JSON errors, passthrough, streamed parts)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ErrorBody;
pub use server::{AppState, RelayServer, ServerError};
