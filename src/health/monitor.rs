//! Background health probing.
//!
//! # Responsibilities
//! - Periodically probe every mapped primary and fallback instance
//! - Keep the latest result per target for the status snapshot
//!
//! # Design Decisions
//! - Observational only: routing never consults these records
//! - A target is healthy iff the probe returns 200 with `status: "healthy"`
//! - Records are replaced whole each cycle, never field-mutated
//! - Only currently mapped targets keep records across cycles
//! - Probing never panics and never fails the cycle

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::schema::GatewayConfig;
use crate::observability::metrics;
use crate::routing::service_mapping;

/// Latest probe result for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub url: String,
    pub healthy: bool,
    pub last_check: DateTime<Utc>,
}

/// Probes mapped service instances on an interval.
///
/// Targets are keyed `"{service_type}_primary"` / `"{service_type}_fallback"`
/// and recomputed from the current config each cycle, so a reload changes
/// what gets probed without a restart.
pub struct HealthMonitor {
    config: Arc<ArcSwap<GatewayConfig>>,
    client: reqwest::Client,
    records: DashMap<String, HealthRecord>,
    stop_tx: broadcast::Sender<()>,
    running: AtomicBool,
}

impl HealthMonitor {
    pub fn new(config: Arc<ArcSwap<GatewayConfig>>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        let (stop_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            client,
            records: DashMap::new(),
            stop_tx,
            running: AtomicBool::new(false),
        })
    }

    /// Spawn the probe loop. No-op when already running or disabled.
    pub fn start(self: &Arc<Self>) {
        let config = self.config.load();
        if !config.health_check.enabled {
            tracing::info!("health checks disabled");
            return;
        }

        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("health monitor already running");
            return;
        }

        let monitor = Arc::clone(self);
        let stop_rx = self.stop_tx.subscribe();
        tokio::spawn(async move {
            monitor.run(stop_rx).await;
            monitor.running.store(false, Ordering::SeqCst);
        });
    }

    /// Signal the probe loop to exit. No-op when not running.
    pub fn stop(&self) {
        // Errors only mean there is no loop listening.
        let _ = self.stop_tx.send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of the latest records, copied out defensively.
    pub fn status(&self) -> BTreeMap<String, HealthRecord> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    async fn run(&self, mut stop_rx: broadcast::Receiver<()>) {
        let config = self.config.load_full();
        tracing::info!(
            interval_secs = config.health_check.interval_secs,
            path = %config.health_check.path,
            "health monitor starting"
        );

        // First tick fires immediately, then every interval.
        let mut ticker = time::interval(Duration::from_secs(config.health_check.interval_secs));
        drop(config);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = stop_rx.recv() => {
                    tracing::info!("health monitor stopping");
                    break;
                }
            }
        }
    }

    /// Probe every mapped target once and replace its record.
    ///
    /// Keys absent from the current mapping are dropped, so records do not
    /// outlive a reload that removes their service type.
    pub async fn check_all(&self) {
        let config = self.config.load_full();
        let mapping = service_mapping(&config);
        let timeout = Duration::from_secs(config.health_check.timeout_secs);

        let mut probed = Vec::with_capacity(mapping.len() * 2);
        for (service_type, endpoint) in &mapping {
            for (role, url) in [("primary", &endpoint.primary), ("fallback", &endpoint.fallback)] {
                let healthy = self.probe(url, &config.health_check.path, timeout).await;
                let key = format!("{service_type}_{role}");
                metrics::record_probe(&key, healthy);
                probed.push(key.clone());
                self.records.insert(
                    key,
                    HealthRecord {
                        url: url.clone(),
                        healthy,
                        last_check: Utc::now(),
                    },
                );
            }
        }

        self.records.retain(|key, _| probed.contains(key));
    }

    /// One probe; any failure mode means unhealthy, never an error.
    async fn probe(&self, url: &str, path: &str, timeout: Duration) -> bool {
        let target = format!("{url}{path}");

        let response = match self.client.get(&target).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %target, error = %e, "health probe failed: unreachable");
                return false;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            tracing::warn!(
                url = %target,
                status = response.status().as_u16(),
                "health probe failed: non-200 status"
            );
            return false;
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => {
                let healthy = body.get("status").and_then(|s| s.as_str()) == Some("healthy");
                if !healthy {
                    tracing::warn!(url = %target, "health probe failed: body not healthy");
                }
                healthy
            }
            Err(e) => {
                tracing::warn!(url = %target, error = %e, "health probe failed: malformed body");
                false
            }
        }
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("targets", &self.records.len())
            .field("running", &self.is_running())
            .finish()
    }
}
