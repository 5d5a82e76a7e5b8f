//! Primary/fallback failover around the forwarder.
//!
//! # Responsibilities
//! - Derive the service type and look up its endpoint pair
//! - Try the primary, then the fallback at most once
//! - Answer 503 when neither instance produced a response
//!
//! # Design Decisions
//! - Health state is never consulted; liveness is probed by the attempt
//! - A structured failure from the primary triggers failover, but any
//!   reply the fallback produces is relayed verbatim, untagged
//! - Unmapped service types forward directly with no retry

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::schema::ServiceEndpoint;
use crate::observability::metrics;
use crate::proxy::forwarder::{ForwardOptions, Forwarder, UpstreamReply};
use crate::proxy::request::ProxiedRequest;
use crate::routing::service_type;

/// Forward with automatic primary → fallback failover.
///
/// `route_upstream` is the route table's base URL, used when the request's
/// service type has no mapping entry.
pub async fn forward_with_failover(
    forwarder: &Forwarder,
    mapping: &BTreeMap<String, ServiceEndpoint>,
    route_upstream: &str,
    path: &str,
    request: &ProxiedRequest,
) -> Response {
    let options = ForwardOptions::default();

    let Some((service_type, endpoint)) = service_type::from_path(path)
        .and_then(|derived| mapping.get_key_value(derived))
    else {
        tracing::debug!(path = %path, "no failover mapping, forwarding directly");
        return forwarder.forward(route_upstream, path, request, options).await;
    };

    tracing::debug!(service_type = %service_type, path = %path, "service type derived");

    tracing::info!(
        service_type = %service_type,
        url = %endpoint.primary,
        "attempting primary"
    );
    match forwarder.dispatch(&endpoint.primary, path, request, options).await {
        Ok(UpstreamReply::Success(response)) => {
            metrics::record_failover(service_type, "primary");
            return response;
        }
        Ok(UpstreamReply::Failure(response)) => {
            tracing::warn!(
                service_type = %service_type,
                status = response.status().as_u16(),
                "primary returned failure status, trying fallback"
            );
        }
        Err(e) => {
            tracing::warn!(
                service_type = %service_type,
                error = %e,
                "primary unreachable, trying fallback"
            );
        }
    }

    tracing::info!(
        service_type = %service_type,
        url = %endpoint.fallback,
        "attempting fallback"
    );
    match forwarder.dispatch(&endpoint.fallback, path, request, options).await {
        // Whatever the fallback answered is relayed verbatim.
        Ok(reply) => {
            metrics::record_failover(service_type, "fallback");
            reply.into_response()
        }
        Err(e) => {
            tracing::error!(
                service_type = %service_type,
                error = %e,
                "fallback unreachable, no instance available"
            );
            metrics::record_failover(service_type, "unavailable");
            both_unavailable(service_type)
        }
    }
}

/// The gateway's reply when neither instance produced a response.
fn both_unavailable(service_type: &str) -> Response {
    let body = Json(json!({
        "error": "Service Unavailable",
        "message": format!(
            "Both primary and fallback services for {service_type} are currently unavailable"
        ),
    }));
    (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
}
