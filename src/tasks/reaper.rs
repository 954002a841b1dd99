//! Job Reaper Task
//!
//! Purges completed and failed jobs after their retention window so the job
//! table stays bounded.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::queue::JobQueue;

/// Spawns the recurring job reaper.
///
/// Only terminal jobs older than `retention_secs` are purged; queued and
/// running jobs are never touched.
pub fn spawn_reaper_task(
    queue: Arc<JobQueue>,
    interval_secs: u64,
    retention_secs: u64,
) -> JoinHandle<()> {
    let retention_ms = retention_secs * 1000;

    tokio::spawn(async move {
        info!(interval_secs, retention_secs, "Starting job reaper task");

        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = queue.reap_older_than(retention_ms);
            if removed > 0 {
                info!(removed, "Reaper purged terminal jobs");
            } else {
                debug!("Reaper found nothing to purge");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Priority;
    use serde_json::json;

    #[tokio::test]
    async fn test_reaper_purges_terminal_jobs() {
        let queue = Arc::new(JobQueue::new(16));

        let id = queue.submit(json!({}), Priority::Normal).unwrap();
        queue.try_pop();
        queue.mark_running(id);
        queue.complete(id, json!({}));

        // Zero retention: purge on the first cycle
        let handle = spawn_reaper_task(queue.clone(), 1, 0);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(queue.status(id).is_err());
        handle.abort();
    }

    #[tokio::test]
    async fn test_reaper_leaves_queued_jobs_alone() {
        let queue = Arc::new(JobQueue::new(16));
        let id = queue.submit(json!({}), Priority::Normal).unwrap();

        let handle = spawn_reaper_task(queue.clone(), 1, 0);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(queue.status(id).is_ok());
        handle.abort();
    }
}
