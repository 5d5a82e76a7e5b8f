//! Health probing subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (monitor.rs)
//!     → GET {url}{health_path} for each mapped primary and fallback
//!     → Replace the target's HealthRecord whole
//!     → status() hands out a defensive snapshot
//! ```
//!
//! # Design Decisions
//! - Purely observational: forwarding and failover never read these records
//! - No thresholds or state machine; each cycle stands on its own
//! - Health state is per-instance, keyed by service type and role

pub mod monitor;

pub use monitor::{HealthMonitor, HealthRecord};
