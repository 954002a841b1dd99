//! Router Module
//!
//! Health-aware load-balanced routing across backend replicas.

mod balancer;
mod health;
mod target;

pub use balancer::{ConnectionGuard, Router, Strategy};
pub use health::{probe_all, spawn_health_check_task};
pub use target::{BackendTarget, TargetSnapshot};
