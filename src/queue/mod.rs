//! Work Queue Module
//!
//! Priority job queue and fixed worker pool for offloading long-running work
//! from the request path.

mod job;
#[allow(clippy::module_inception)]
mod queue;
mod worker;

pub use job::{Job, JobStatus, Priority};
pub use queue::{JobQueue, QueueSnapshot};
pub use worker::{spawn_workers, JobHandler, SimulatedHandler};
