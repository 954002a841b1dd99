//! Background Tasks Module
//!
//! Recurring tasks that run alongside the request path.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache entries and idle rate-limiter
//!   windows at configured intervals
//! - Job reaper: purges terminal jobs after their retention window

mod reaper;
mod sweep;

pub use reaper::spawn_reaper_task;
pub use sweep::spawn_sweep_task;
