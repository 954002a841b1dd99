//! Router Module
//!
//! Health-aware load balancing across backend replicas. Four strategies, all
//! operating only over healthy targets; selection hands back a scoped guard
//! so the active connection count is always released, even on panics or
//! early returns.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use rand::Rng;
use tracing::info;

use crate::error::{Result, TierError};
use crate::router::{BackendTarget, TargetSnapshot};

// == Strategy ==
/// Backend selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Cyclic pointer advanced on every call, skipping unhealthy targets
    #[default]
    RoundRobin,
    /// Cyclic over a weight-expanded multiset; higher weight, more selections
    WeightedRoundRobin,
    /// Healthy target with the fewest active connections, ties by insertion order
    LeastConnections,
    /// Uniform choice among healthy targets
    Random,
}

impl std::str::FromStr for Strategy {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "round_robin" => Ok(Strategy::RoundRobin),
            "weighted" | "weighted_round_robin" => Ok(Strategy::WeightedRoundRobin),
            "least_connections" => Ok(Strategy::LeastConnections),
            "random" => Ok(Strategy::Random),
            _ => Err(()),
        }
    }
}

// == Connection Guard ==
/// A selected backend whose connection slot is released on drop.
///
/// Pairing `select` with a guaranteed release keeps the least-connections
/// counters honest without manual bookkeeping on every code path.
#[derive(Debug)]
pub struct ConnectionGuard {
    target: Arc<BackendTarget>,
}

impl ConnectionGuard {
    fn new(target: Arc<BackendTarget>) -> Self {
        target.acquire();
        Self { target }
    }
}

impl Deref for ConnectionGuard {
    type Target = BackendTarget;

    fn deref(&self) -> &Self::Target {
        &self.target
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.target.release();
    }
}

// == Router ==
/// Load balancer over a reloadable set of backend targets.
#[derive(Debug, Default)]
pub struct Router {
    targets: RwLock<Vec<Arc<BackendTarget>>>,
    rr_cursor: AtomicUsize,
    weighted_cursor: AtomicUsize,
}

impl Router {
    // == Constructor ==
    /// Creates a router from `(address, weight)` pairs.
    pub fn new(backends: &[(String, u32)]) -> Self {
        let targets = backends
            .iter()
            .map(|(address, weight)| Arc::new(BackendTarget::new(address.clone(), *weight)))
            .collect();

        Self {
            targets: RwLock::new(targets),
            rr_cursor: AtomicUsize::new(0),
            weighted_cursor: AtomicUsize::new(0),
        }
    }

    // == Select ==
    /// Selects a healthy backend using the given strategy.
    ///
    /// The returned guard holds the incremented connection count; dropping it
    /// is the release. Fails with `NoHealthyBackend` when zero targets are
    /// healthy rather than blocking or picking an unhealthy one.
    pub fn select(&self, strategy: Strategy) -> Result<ConnectionGuard> {
        let targets = self.all_targets();
        if targets.is_empty() {
            return Err(TierError::NoHealthyBackend);
        }

        let chosen = match strategy {
            Strategy::RoundRobin => self.select_round_robin(&targets),
            Strategy::WeightedRoundRobin => self.select_weighted(&targets),
            Strategy::LeastConnections => self.select_least_connections(&targets),
            Strategy::Random => self.select_random(&targets),
        };

        chosen
            .map(ConnectionGuard::new)
            .ok_or(TierError::NoHealthyBackend)
    }

    fn select_round_robin(&self, targets: &[Arc<BackendTarget>]) -> Option<Arc<BackendTarget>> {
        // Advancing the cursor at most len times visits every index once
        for _ in 0..targets.len() {
            let idx = self.rr_cursor.fetch_add(1, Ordering::AcqRel) % targets.len();
            if targets[idx].is_healthy() {
                return Some(targets[idx].clone());
            }
        }
        None
    }

    fn select_weighted(&self, targets: &[Arc<BackendTarget>]) -> Option<Arc<BackendTarget>> {
        let mut expanded: Vec<usize> = Vec::new();
        for (idx, target) in targets.iter().enumerate() {
            if target.is_healthy() {
                expanded.extend(std::iter::repeat(idx).take(target.weight as usize));
            }
        }
        if expanded.is_empty() {
            return None;
        }

        let slot = self.weighted_cursor.fetch_add(1, Ordering::AcqRel) % expanded.len();
        Some(targets[expanded[slot]].clone())
    }

    fn select_least_connections(
        &self,
        targets: &[Arc<BackendTarget>],
    ) -> Option<Arc<BackendTarget>> {
        // Strict less-than keeps the earliest target on ties
        targets
            .iter()
            .filter(|t| t.is_healthy())
            .fold(None::<&Arc<BackendTarget>>, |best, t| match best {
                Some(b) if t.active_connections() < b.active_connections() => Some(t),
                Some(b) => Some(b),
                None => Some(t),
            })
            .cloned()
    }

    fn select_random(&self, targets: &[Arc<BackendTarget>]) -> Option<Arc<BackendTarget>> {
        let healthy: Vec<&Arc<BackendTarget>> =
            targets.iter().filter(|t| t.is_healthy()).collect();
        if healthy.is_empty() {
            return None;
        }

        let idx = rand::thread_rng().gen_range(0..healthy.len());
        Some(healthy[idx].clone())
    }

    // == Target Access ==
    /// Returns the current target set (shared handles, not copies).
    pub fn all_targets(&self) -> Vec<Arc<BackendTarget>> {
        self.targets
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Replaces the target set (configuration reload). Cursors restart so the
    /// new set is walked from the beginning.
    pub fn set_targets(&self, backends: &[(String, u32)]) {
        let targets: Vec<Arc<BackendTarget>> = backends
            .iter()
            .map(|(address, weight)| Arc::new(BackendTarget::new(address.clone(), *weight)))
            .collect();

        if let Ok(mut guard) = self.targets.write() {
            info!(count = targets.len(), "Replacing backend target set");
            *guard = targets;
        }
        self.rr_cursor.store(0, Ordering::Release);
        self.weighted_cursor.store(0, Ordering::Release);
    }

    // == Snapshot ==
    /// Per-target observability view.
    pub fn snapshot(&self) -> Vec<TargetSnapshot> {
        self.all_targets()
            .iter()
            .map(|t| TargetSnapshot::from(t.as_ref()))
            .collect()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn router(entries: &[(&str, u32)]) -> Router {
        let backends: Vec<(String, u32)> = entries
            .iter()
            .map(|(addr, w)| (addr.to_string(), *w))
            .collect();
        Router::new(&backends)
    }

    fn tally(router: &Router, strategy: Strategy, calls: usize) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for _ in 0..calls {
            let guard = router.select(strategy).unwrap();
            *counts.entry(guard.address.clone()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_round_robin_fairness() {
        let r = router(&[("http://a", 1), ("http://b", 1), ("http://c", 1)]);

        let counts = tally(&r, Strategy::RoundRobin, 90);
        assert_eq!(counts["http://a"], 30);
        assert_eq!(counts["http://b"], 30);
        assert_eq!(counts["http://c"], 30);
    }

    #[test]
    fn test_round_robin_skips_unhealthy() {
        let r = router(&[("http://a", 1), ("http://b", 1), ("http://c", 1)]);
        r.all_targets()[1].set_healthy(false, 0);

        let counts = tally(&r, Strategy::RoundRobin, 40);
        assert!(!counts.contains_key("http://b"));
        assert_eq!(counts["http://a"] + counts["http://c"], 40);
    }

    #[test]
    fn test_weighted_distribution_is_proportional() {
        let r = router(&[("http://a", 3), ("http://b", 2), ("http://c", 1)]);

        // 600 calls over a weight multiset of 6 slots: exactly 100 full cycles
        let counts = tally(&r, Strategy::WeightedRoundRobin, 600);
        assert_eq!(counts["http://a"], 300);
        assert_eq!(counts["http://b"], 200);
        assert_eq!(counts["http://c"], 100);
    }

    #[test]
    fn test_least_connections_prefers_idle_target() {
        let r = router(&[("http://a", 1), ("http://b", 1)]);

        let held = r.select(Strategy::LeastConnections).unwrap();
        assert_eq!(held.address, "http://a");
        assert_eq!(held.active_connections(), 1);

        // With 'a' holding a connection, 'b' is now the least loaded
        let next = r.select(Strategy::LeastConnections).unwrap();
        assert_eq!(next.address, "http://b");
    }

    #[test]
    fn test_least_connections_ties_break_by_insertion_order() {
        let r = router(&[("http://a", 1), ("http://b", 1), ("http://c", 1)]);

        let guard = r.select(Strategy::LeastConnections).unwrap();
        assert_eq!(guard.address, "http://a");
    }

    #[test]
    fn test_guard_drop_releases_connection() {
        let r = router(&[("http://a", 1)]);

        {
            let guard = r.select(Strategy::RoundRobin).unwrap();
            assert_eq!(guard.active_connections(), 1);
        }

        assert_eq!(r.all_targets()[0].active_connections(), 0);
    }

    #[test]
    fn test_random_only_selects_healthy() {
        let r = router(&[("http://a", 1), ("http://b", 1)]);
        r.all_targets()[0].set_healthy(false, 0);

        let counts = tally(&r, Strategy::Random, 20);
        assert_eq!(counts["http://b"], 20);
    }

    #[test]
    fn test_all_unhealthy_fails() {
        let r = router(&[("http://a", 1), ("http://b", 1)]);
        for t in r.all_targets() {
            t.set_healthy(false, 0);
        }

        for strategy in [
            Strategy::RoundRobin,
            Strategy::WeightedRoundRobin,
            Strategy::LeastConnections,
            Strategy::Random,
        ] {
            assert!(matches!(
                r.select(strategy),
                Err(TierError::NoHealthyBackend)
            ));
        }
    }

    #[test]
    fn test_empty_router_fails() {
        let r = Router::default();
        assert!(matches!(
            r.select(Strategy::RoundRobin),
            Err(TierError::NoHealthyBackend)
        ));
    }

    #[test]
    fn test_set_targets_replaces_and_resets() {
        let r = router(&[("http://a", 1)]);

        r.set_targets(&[("http://x".to_string(), 1), ("http://y".to_string(), 1)]);

        let snapshot = r.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].address, "http://x");
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("round_robin".parse::<Strategy>(), Ok(Strategy::RoundRobin));
        assert_eq!(
            "least_connections".parse::<Strategy>(),
            Ok(Strategy::LeastConnections)
        );
        assert_eq!(
            "weighted".parse::<Strategy>(),
            Ok(Strategy::WeightedRoundRobin)
        );
        assert!("fastest".parse::<Strategy>().is_err());
    }
}
