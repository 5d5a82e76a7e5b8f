//! HR Platform API Gateway
//!
//! The forwarding and failover front for the HR/payroll backend services,
//! built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────┐
//!                    │                    API GATEWAY                     │
//!                    │                                                    │
//!   Client Request   │  ┌────────┐   ┌─────────┐   ┌──────────────────┐  │
//!   ─────────────────┼─▶│  http  │──▶│ routing │──▶│      proxy       │  │
//!                    │  │ server │   │  table  │   │ failover+forward │  │
//!                    │  └────────┘   └─────────┘   └────────┬─────────┘  │
//!                    │                                      │            │
//!   Client Response  │                              primary │ fallback   │
//!   ◀────────────────┼──────────────────────────────────────┼────────────┼──▶ Backend
//!                    │                                      │            │    Services
//!                    │  ┌──────────────────────────────────────────────┐ │
//!                    │  │            Cross-Cutting Concerns            │ │
//!                    │  │  ┌────────┐ ┌────────┐ ┌────────┐ ┌───────┐  │ │
//!                    │  │  │ config │ │ health │ │observa-│ │ life- │  │ │
//!                    │  │  │ reload │ │ probes │ │ bility │ │ cycle │  │ │
//!                    │  │  └────────┘ └────────┘ └────────┘ └───────┘  │ │
//!                    │  └──────────────────────────────────────────────┘ │
//!                    └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use hr_gateway::config::{load_config, ConfigWatcher};
use hr_gateway::observability;
use hr_gateway::{GatewayConfig, GatewayServer, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "hr-gateway", version, about = "API gateway for the HR platform")]
struct Args {
    /// Path to the TOML configuration file. Defaults apply without one.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listener.bind_address = listen;
    }

    observability::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "failed to parse metrics address"
                );
            }
        }
    }

    // Hot reload only applies when a config file is in play.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        None => (mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = GatewayServer::new(config)?;
    server.run(listener, config_updates, shutdown).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
