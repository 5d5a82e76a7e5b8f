//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so the gateway runs unconfigured.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration for the API gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Route definitions mapping path prefixes to upstream base URLs.
    pub routes: Vec<RouteConfig>,

    /// Per-service-type failover endpoints, overlaid on the built-in
    /// defaults by `routing::mapping::service_mapping`.
    pub services: BTreeMap<String, ServiceEndpoint>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            routes: default_routes(),
            services: BTreeMap::new(),
            health_check: HealthCheckConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum inbound body size in bytes (JSON payloads and file uploads).
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Route configuration mapping a path prefix to an upstream service.
///
/// The longest matching prefix wins; paths that match no route get a 404.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match.
    pub path_prefix: String,

    /// Upstream base URL to forward to.
    pub upstream: String,
}

/// Default route table for the HR platform services.
fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            name: "auth".to_string(),
            path_prefix: "/v1/auth".to_string(),
            upstream: "http://localhost:3001".to_string(),
        },
        RouteConfig {
            name: "payroll".to_string(),
            path_prefix: "/v1/payroll".to_string(),
            upstream: "http://localhost:3004".to_string(),
        },
        RouteConfig {
            name: "hr".to_string(),
            path_prefix: "/v1".to_string(),
            upstream: "http://localhost:3002".to_string(),
        },
    ]
}

/// Primary/fallback base URL pair for one failover-managed service type.
///
/// A configuration value; never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceEndpoint {
    /// Preferred instance, always attempted first.
    pub primary: String,

    /// Secondary instance, attempted at most once when the primary fails.
    pub fallback: String,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the background health monitor.
    pub enabled: bool,

    /// Probe cycle interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,

    /// Path appended to each base URL for probes.
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            timeout_secs: 5,
            path: "/health".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Per outbound call timeout in seconds. A stalled attempt that
    /// exceeds it counts as a failure eligible for failover.
    pub upstream_secs: u64,

    /// Total inbound request/response timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let config = GatewayConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.health_check.interval_secs, 30);
        assert_eq!(config.health_check.path, "/health");
        assert_eq!(config.timeouts.upstream_secs, 30);
        assert!(config.services.is_empty());
        assert!(config.routes.iter().any(|r| r.path_prefix == "/v1"));
    }

    #[test]
    fn partial_toml_fills_missing_sections() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9999"

            [services.employees]
            primary = "http://emp-a:3002"
            fallback = "http://emp-b:3002"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        // Unset fields inside a present section fall back too.
        assert_eq!(config.listener.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(config.services["employees"].primary, "http://emp-a:3002");
        assert_eq!(config.timeouts.connect_secs, 5);
        assert!(config.health_check.enabled);
    }
}
