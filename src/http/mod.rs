//! HTTP surface subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → request.rs (request ID generation and propagation)
//!     → proxy subsystem (capture, failover, forward)
//!     → Response relayed to client
//! ```

pub mod request;
pub mod server;

pub use request::{MakeGatewayRequestId, X_REQUEST_ID};
pub use server::{AppState, GatewayServer};
