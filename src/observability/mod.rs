//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, dedicated listener)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all log lines via tower-http layers
//! - Metrics are cheap (atomic increments)
//! - Neither logging nor metrics can fail a request

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
