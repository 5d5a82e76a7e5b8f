//! Request identification.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID for every inbound request
//! - Propagate the ID to the response so callers can correlate logs
//!
//! # Design Decisions
//! - The ID is set as early as possible so every trace line carries it
//! - An ID supplied by the caller is kept; only missing IDs are generated

use axum::body::Body;
use axum::http::Request;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID across hops.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID source handed to `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeGatewayRequestId;

impl MakeRequestId for MakeGatewayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        Uuid::new_v4()
            .to_string()
            .parse()
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the layer, for log correlation in handlers.
pub fn request_id(request: &Request<Body>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
