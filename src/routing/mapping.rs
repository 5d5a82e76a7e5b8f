//! Service type → endpoint pair mapping.
//!
//! # Responsibilities
//! - Resolve which primary/fallback pair serves a given service type
//! - Overlay configured endpoints on the built-in defaults
//!
//! # Design Decisions
//! - Recomputed from the current config on every call, never cached, so a
//!   hot reload takes effect on the next request
//! - Built-in defaults let the gateway run with no config file at all
//! - Each service type is an independent entry even when values coincide

use std::collections::BTreeMap;

use crate::config::schema::{GatewayConfig, ServiceEndpoint};

const DEFAULT_PRIMARY: &str = "http://localhost:3002";
const DEFAULT_FALLBACK: &str = "http://localhost:3003";

/// Service types the gateway fails over for out of the box.
const DEFAULT_SERVICE_TYPES: [&str; 5] = [
    "employees",
    "departments",
    "positions",
    "contract-types",
    "marital-status",
];

/// Build the service mapping from the given configuration.
pub fn service_mapping(config: &GatewayConfig) -> BTreeMap<String, ServiceEndpoint> {
    let mut mapping = BTreeMap::new();

    for service_type in DEFAULT_SERVICE_TYPES {
        mapping.insert(
            service_type.to_string(),
            ServiceEndpoint {
                primary: DEFAULT_PRIMARY.to_string(),
                fallback: DEFAULT_FALLBACK.to_string(),
            },
        );
    }

    for (service_type, endpoint) in &config.services {
        mapping.insert(service_type.clone(), endpoint.clone());
    }

    mapping
}
