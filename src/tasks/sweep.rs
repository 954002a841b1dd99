//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from every
//! cache level and drops idle rate-limiter windows, so stale state is
//! reclaimed even without being accessed.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::admission::RateLimiter;
use crate::cache::CacheEngine;

/// Spawns the recurring expiry sweep.
///
/// Runs on a fixed interval and takes each level's lock only for the
/// duration of that level's sweep. Idle rate-limiter clients are dropped in
/// the same cycle. Returns a JoinHandle that shutdown aborts.
pub fn spawn_sweep_task(
    cache: Arc<CacheEngine>,
    limiter: Arc<RateLimiter>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs, "Starting expiry sweep task");

        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.tick().await; // immediate first tick, nothing to sweep yet

        loop {
            ticker.tick().await;

            let removed = cache.sweep_expired().await;
            let idle_clients = limiter.sweep_idle();
            if removed > 0 || idle_clients > 0 {
                info!(removed, idle_clients, "Expiry sweep reclaimed state");
            } else {
                debug!("Expiry sweep found nothing to reclaim");
            }
        }
    })
}
