//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handlers and the dispatcher produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (log aggregation)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request via TraceLayer
//! - Metrics are cheap (atomic increments); recording without an
//!   installed recorder is a no-op

pub mod logging;
pub mod metrics;
