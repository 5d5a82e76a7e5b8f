//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Initialize subsystems → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C or trigger() → broadcast → server drains, monitor stops
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans out to every long-running task
//! - Subsystems stop in reverse start order: listener drains, then monitor

pub mod shutdown;

pub use shutdown::Shutdown;
