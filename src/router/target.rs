//! Backend Target Module
//!
//! A single backend replica with routing weight, health flag, and an active
//! connection counter. Health is flipped by the probe loop while connection
//! counts move on the request path, so both fields are atomics.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

// == Backend Target ==
#[derive(Debug)]
pub struct BackendTarget {
    /// Base address of the backend (e.g. `http://127.0.0.1:9001`)
    pub address: String,
    /// Routing weight; higher weight receives proportionally more traffic
    pub weight: u32,
    healthy: AtomicBool,
    active: AtomicUsize,
    last_check_ms: AtomicU64,
}

impl BackendTarget {
    // == Constructor ==
    /// Creates a target that is considered healthy until the first probe
    /// says otherwise.
    pub fn new(address: impl Into<String>, weight: u32) -> Self {
        Self {
            address: address.into(),
            weight: weight.max(1),
            healthy: AtomicBool::new(true),
            active: AtomicUsize::new(0),
            last_check_ms: AtomicU64::new(0),
        }
    }

    // == Health ==
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Records a probe outcome with its timestamp.
    pub fn set_healthy(&self, healthy: bool, checked_at_ms: u64) {
        self.healthy.store(healthy, Ordering::Release);
        self.last_check_ms.store(checked_at_ms, Ordering::Release);
    }

    pub fn last_check_ms(&self) -> u64 {
        self.last_check_ms.load(Ordering::Acquire)
    }

    // == Connection Counting ==
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Increments the active connection count on selection.
    pub fn acquire(&self) {
        self.active.fetch_add(1, Ordering::AcqRel);
    }

    /// Decrements the active connection count on request completion.
    pub fn release(&self) {
        // Saturating: a stray release must not wrap the counter
        let _ = self
            .active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

// == Target Snapshot ==
/// Serializable point-in-time view of a target for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TargetSnapshot {
    pub address: String,
    pub weight: u32,
    pub healthy: bool,
    pub active_connections: usize,
    pub last_check_ms: u64,
}

impl From<&BackendTarget> for TargetSnapshot {
    fn from(target: &BackendTarget) -> Self {
        Self {
            address: target.address.clone(),
            weight: target.weight,
            healthy: target.is_healthy(),
            active_connections: target.active_connections(),
            last_check_ms: target.last_check_ms(),
        }
    }
}
