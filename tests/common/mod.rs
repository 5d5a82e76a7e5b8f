//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use hr_gateway::config::schema::{RouteConfig, ServiceEndpoint};
use hr_gateway::{GatewayConfig, GatewayServer, Shutdown};

/// Serve a mock upstream on an ephemeral port, returning its address.
pub async fn spawn_upstream(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

/// An address nothing listens on, for unreachable-upstream scenarios.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

/// Start the gateway on an ephemeral port.
///
/// Returns the gateway's base URL and a shutdown handle for cleanup.
pub async fn spawn_gateway(config: GatewayConfig) -> (String, Shutdown) {
    let (url, shutdown, _updates) = spawn_gateway_with_updates(config).await;
    (url, shutdown)
}

/// Like `spawn_gateway`, but also hands back the config update channel.
pub async fn spawn_gateway_with_updates(
    config: GatewayConfig,
) -> (String, Shutdown, mpsc::UnboundedSender<GatewayConfig>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (update_tx, config_updates) = mpsc::unbounded_channel();
    let server = GatewayServer::new(config).unwrap();
    let server_shutdown = shutdown.clone();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    let url = base_url(addr);
    wait_ready(&url).await;
    (url, shutdown, update_tx)
}

/// Poll the gateway's own health endpoint until it accepts connections.
async fn wait_ready(url: &str) {
    let client = test_client();
    for _ in 0..50 {
        if client.get(format!("{url}/health")).send().await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("gateway at {url} never became ready");
}

pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Config with one /v1 route and health checks off.
pub fn route_only_config(upstream: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.routes = vec![RouteConfig {
        name: "hr".to_string(),
        path_prefix: "/v1".to_string(),
        upstream: base_url(upstream),
    }];
    config.health_check.enabled = false;
    config
}

/// Config mapping the `employees` service type to the given pair.
pub fn failover_config(primary: SocketAddr, fallback: SocketAddr) -> GatewayConfig {
    let mut config = route_only_config(primary);
    config.services.insert(
        "employees".to_string(),
        ServiceEndpoint {
            primary: base_url(primary),
            fallback: base_url(fallback),
        },
    );
    config
}
