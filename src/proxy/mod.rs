//! Request forwarding and failover subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → request.rs (capture: method, filtered headers, query, buffered body)
//!     → failover.rs (service type → primary/fallback attempts)
//!     → forwarder.rs (one outbound call per attempt, relay conversion)
//!     → Response relayed to the caller
//! ```
//!
//! # Design Decisions
//! - At most one outbound attempt per target per inbound request
//! - Exactly one response value leaves the subsystem per request
//! - Failover is keyed by service type, not by health state

pub mod failover;
pub mod forwarder;
pub mod request;

pub use failover::forward_with_failover;
pub use forwarder::{ForwardError, ForwardOptions, Forwarder, UpstreamReply};
pub use request::{BufferedFile, CaptureError, ProxiedRequest, RequestBody};
