//! Worker Pool Module
//!
//! A fixed pool of long-lived worker tasks draining the job queue in strict
//! priority order. Execution failures land on the job record, never on the
//! worker.

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::queue::JobQueue;

// == Job Handler ==
/// Executes one job payload. The seam between the queue machinery and the
/// actual work, so tests and deployments can plug in their own logic.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, payload: &Value) -> anyhow::Result<Value>;
}

// == Simulated Handler ==
/// Default handler interpreting the payload as a simulated workload:
///
/// - `duration_ms` (number): how long the job takes (default 0)
/// - `fail` (bool): force a failure after the duration elapses
/// - `echo` (any): copied verbatim into the result
pub struct SimulatedHandler;

#[async_trait]
impl JobHandler for SimulatedHandler {
    async fn run(&self, payload: &Value) -> anyhow::Result<Value> {
        let duration_ms = payload
            .get("duration_ms")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        if payload.get("fail").and_then(Value::as_bool).unwrap_or(false) {
            bail!("Simulated job failure");
        }

        Ok(json!({
            "processed": true,
            "echo": payload.get("echo").cloned().unwrap_or(Value::Null),
        }))
    }
}

// == Worker Pool ==
/// Spawns `count` worker tasks over the shared queue.
///
/// Each worker processes one job at a time: dequeue, mark running, execute,
/// record the outcome. Returns the JoinHandles so shutdown can abort them.
pub fn spawn_workers(
    queue: Arc<JobQueue>,
    handler: Arc<dyn JobHandler>,
    count: usize,
) -> Vec<JoinHandle<()>> {
    info!(count, "Starting worker pool");

    (0..count)
        .map(|worker_id| {
            let queue = queue.clone();
            let handler = handler.clone();

            tokio::spawn(async move {
                loop {
                    let id = queue.next_job().await;

                    let Some(payload) = queue.mark_running(id) else {
                        // Record was reaped between pop and start
                        continue;
                    };
                    debug!(worker_id, job_id = %id, "Worker picked up job");

                    match handler.run(&payload).await {
                        Ok(result) => {
                            queue.complete(id, result);
                            debug!(worker_id, job_id = %id, "Job completed");
                        }
                        Err(err) => {
                            queue.fail(id, err.to_string());
                            warn!(worker_id, job_id = %id, error = %err, "Job failed");
                        }
                    }
                }
            })
        })
        .collect()
}
