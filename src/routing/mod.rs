//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → routes.rs (longest-prefix match → upstream base URL)
//!     → service_type.rs (derive service type segment)
//!     → mapping.rs (service type → primary/fallback pair)
//!
//! Route compilation (startup and config reload):
//!     RouteConfig[]
//!     → sort by prefix length
//!     → freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - All three pieces are pure functions of path and current config
//! - Deterministic: same input always resolves the same way
//! - Longest prefix wins; unmatched paths are an explicit no-match

pub mod mapping;
pub mod routes;
pub mod service_type;

pub use mapping::service_mapping;
pub use routes::{Route, RouteTable};
