//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all proxy handler
//! - Wire up middleware (tracing, request timeout, body limit, request ID)
//! - Serve with graceful shutdown and apply config reloads
//! - Hand requests to the failover layer
//! - Expose the gateway's own health endpoint

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::schema::GatewayConfig;
use crate::health::HealthMonitor;
use crate::http::request::{request_id, MakeGatewayRequestId};
use crate::lifecycle::Shutdown;
use crate::proxy::{forward_with_failover, Forwarder, ProxiedRequest};
use crate::routing::{service_mapping, RouteTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<GatewayConfig>>,
    pub routes: Arc<ArcSwap<RouteTable>>,
    pub forwarder: Arc<Forwarder>,
    pub health: Arc<HealthMonitor>,
}

/// The gateway's HTTP server.
pub struct GatewayServer {
    router: Router,
    state: AppState,
}

impl GatewayServer {
    /// Create a server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let routes = RouteTable::compile(&config.routes);
        let forwarder = Forwarder::new(&config.timeouts)?;
        let config = Arc::new(ArcSwap::from_pointee(config));
        let health = HealthMonitor::new(Arc::clone(&config))?;

        let state = AppState {
            config,
            routes: Arc::new(ArcSwap::from_pointee(routes)),
            forwarder: Arc::new(forwarder),
            health: Arc::new(health),
        };

        let router = Self::build_router(&state);
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: &AppState) -> Router {
        let config = state.config.load();

        Router::new()
            .route("/health", get(health_handler))
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state.clone())
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeGatewayRequestId))
    }

    /// Run the server until shutdown, applying config updates as they land.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "gateway listening");

        self.state.health.start();

        let reload_state = self.state.clone();
        let mut reload_shutdown = shutdown.subscribe();
        let reload_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => {
                        let Some(new_config) = update else { break };
                        reload_state
                            .routes
                            .store(Arc::new(RouteTable::compile(&new_config.routes)));
                        reload_state.config.store(Arc::new(new_config));
                        tracing::info!("configuration reloaded");
                    }
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        let mut serve_shutdown = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = serve_shutdown.recv().await;
            })
            .await?;

        self.state.health.stop();
        reload_task.abort();
        tracing::info!("gateway stopped");
        Ok(())
    }
}

/// Main proxy handler: route lookup, capture, failover-wrapped forward.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();
    let id = request_id(&request).to_string();

    tracing::debug!(
        request_id = %id,
        method = %request.method(),
        path = %path,
        "proxying request"
    );

    let route = state.routes.load().resolve(&path).cloned();
    let Some(route) = route else {
        tracing::warn!(request_id = %id, path = %path, "no route matched");
        let body = Json(json!({
            "error": "Not Found",
            "message": format!("No route for {path}"),
        }));
        return (StatusCode::NOT_FOUND, body).into_response();
    };
    tracing::debug!(
        request_id = %id,
        route = %route.name,
        upstream = %route.upstream,
        "route matched"
    );

    let max_body_bytes = state.config.load().listener.max_body_bytes;
    let proxied = match ProxiedRequest::capture(request, max_body_bytes).await {
        Ok(proxied) => proxied,
        Err(e) => {
            tracing::warn!(request_id = %id, error = %e, "failed to capture request");
            let body = Json(json!({
                "error": "Bad Request",
                "details": e.to_string(),
            }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }
    };

    let config = state.config.load();
    let mapping = service_mapping(&config);
    forward_with_failover(&state.forwarder, &mapping, &route.upstream, &path, &proxied).await
}

/// The gateway's own liveness endpoint, shaped like the probe protocol.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "services": state.health.status(),
    }))
}
