//! Mini Gateway - A resilient request-serving tier
//!
//! Multi-level caching, health-aware load balancing, priority background
//! jobs, and admission control behind a single HTTP surface.

pub mod admission;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod queue;
pub mod router;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use queue::spawn_workers;
pub use router::spawn_health_check_task;
pub use tasks::{spawn_reaper_task, spawn_sweep_task};
