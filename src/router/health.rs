//! Backend Health Checking
//!
//! Background loop that probes every configured target with a lightweight
//! liveness call and a bounded timeout, continuously revising which backends
//! are eligible for routing.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::current_timestamp_ms;
use crate::router::Router;

// == Probe All ==
/// Runs one probe cycle over the router's current targets.
///
/// A 2xx response within the timeout marks a target healthy; any error,
/// non-success status, or timeout marks it unhealthy. Factored out of the
/// loop so tests can drive a single cycle deterministically.
pub async fn probe_all(router: &Router, client: &reqwest::Client, timeout: Duration) {
    for target in router.all_targets() {
        let url = format!("{}/health", target.address);
        let was_healthy = target.is_healthy();

        let healthy = match client.get(&url).timeout(timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(address = %target.address, error = %err, "Health probe failed");
                false
            }
        };

        target.set_healthy(healthy, current_timestamp_ms());

        if healthy != was_healthy {
            if healthy {
                info!(address = %target.address, "Backend recovered");
            } else {
                warn!(address = %target.address, "Backend marked unhealthy");
            }
        }
    }
}

// == Health Check Task ==
/// Spawns the recurring health check loop.
///
/// Returns a JoinHandle so the task can be aborted during graceful shutdown.
pub fn spawn_health_check_task(
    router: Arc<Router>,
    client: reqwest::Client,
    interval_secs: u64,
    timeout_ms: u64,
) -> JoinHandle<()> {
    let timeout = Duration::from_millis(timeout_ms);

    tokio::spawn(async move {
        info!(
            interval_secs,
            timeout_ms, "Starting backend health check loop"
        );

        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // First tick fires immediately so startup health is known right away
        loop {
            ticker.tick().await;
            probe_all(&router, &client, timeout).await;
        }
    })
}
