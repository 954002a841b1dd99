//! Rate Limiter Module
//!
//! Sliding-window counter per client identity. Timestamps older than the
//! window are pruned lazily on each check, so idle clients cost nothing.

use dashmap::DashMap;

use crate::cache::current_timestamp_ms;
use crate::error::{Result, TierError};

// == Rate Limiter ==
/// Per-client sliding-window rate limiter.
///
/// State is keyed per client in a concurrent map, so checks for different
/// clients never contend on a shared lock.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window_ms: u64,
    windows: DashMap<String, Vec<u64>>,
}

impl RateLimiter {
    // == Constructor ==
    /// Creates a limiter allowing `limit` requests per `window_secs` seconds.
    pub fn new(limit: usize, window_secs: u64) -> Self {
        Self {
            limit,
            window_ms: window_secs * 1000,
            windows: DashMap::new(),
        }
    }

    // == Check ==
    /// Admits or rejects a request for the given client identity.
    ///
    /// On admission the current timestamp is recorded against the client;
    /// a rejection records nothing, so rejected requests consume no quota.
    pub fn check(&self, client_id: &str) -> Result<()> {
        self.check_at(client_id, current_timestamp_ms())
    }

    /// Clock-explicit form of `check`, used directly by tests to exercise
    /// window boundaries deterministically.
    pub fn check_at(&self, client_id: &str, now_ms: u64) -> Result<()> {
        let mut timestamps = self.windows.entry(client_id.to_string()).or_default();

        timestamps.retain(|ts| now_ms.saturating_sub(*ts) < self.window_ms);

        if timestamps.len() >= self.limit {
            return Err(TierError::AdmissionRejected(client_id.to_string()));
        }

        timestamps.push(now_ms);
        Ok(())
    }

    // == Sweep Idle ==
    /// Drops clients whose recorded timestamps have all aged out of the
    /// window, so identities seen once (e.g. per-IP) do not accumulate
    /// forever. Returns the number of clients dropped.
    pub fn sweep_idle(&self) -> usize {
        self.sweep_idle_at(current_timestamp_ms())
    }

    /// Clock-explicit form of `sweep_idle` for deterministic tests.
    pub fn sweep_idle_at(&self, now_ms: u64) -> usize {
        let mut removed = 0;

        self.windows.retain(|_, timestamps| {
            let live = timestamps
                .iter()
                .any(|ts| now_ms.saturating_sub(*ts) < self.window_ms);
            if !live {
                removed += 1;
            }
            live
        });

        removed
    }

    // == Observability ==
    /// Number of requests currently counted against a client.
    pub fn current_count(&self, client_id: &str) -> usize {
        self.windows
            .get(client_id)
            .map(|timestamps| timestamps.len())
            .unwrap_or(0)
    }

    /// Number of client identities currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_under_limit_are_admitted() {
        let limiter = RateLimiter::new(3, 60);

        for _ in 0..3 {
            assert!(limiter.check("client").is_ok());
        }
        assert_eq!(limiter.current_count("client"), 3);
    }

    #[test]
    fn test_limit_boundary() {
        let limiter = RateLimiter::new(5, 60);
        let t0 = 1_000_000;

        for i in 0..5 {
            assert!(limiter.check_at("client", t0 + i * 1000).is_ok());
        }

        // Sixth request within 60s of the first is rejected
        let result = limiter.check_at("client", t0 + 30_000);
        assert!(matches!(result, Err(TierError::AdmissionRejected(_))));

        // At t0+61s the first timestamp has aged out, so one slot is free
        assert!(limiter.check_at("client", t0 + 61_000).is_ok());
    }

    #[test]
    fn test_rejection_consumes_no_quota() {
        let limiter = RateLimiter::new(1, 60);
        let t0 = 1_000_000;

        assert!(limiter.check_at("client", t0).is_ok());
        for _ in 0..10 {
            assert!(limiter.check_at("client", t0 + 1000).is_err());
        }

        assert_eq!(limiter.current_count("client"), 1);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1, 60);

        assert!(limiter.check("alice").is_ok());
        assert!(limiter.check("alice").is_err());
        assert!(limiter.check("bob").is_ok());
    }

    #[test]
    fn test_sweep_idle_drops_aged_out_clients() {
        let limiter = RateLimiter::new(5, 60);
        let t0 = 1_000_000;

        limiter.check_at("idle", t0).unwrap();
        limiter.check_at("active", t0 + 59_000).unwrap();
        assert_eq!(limiter.tracked_clients(), 2);

        // Only the client with no timestamps left in the window is dropped
        let removed = limiter.sweep_idle_at(t0 + 61_000);
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(limiter.current_count("idle"), 0);

        // A swept client is simply re-tracked on its next request
        assert!(limiter.check_at("idle", t0 + 61_000).is_ok());
    }

    #[test]
    fn test_sweep_idle_keeps_clients_with_live_quota() {
        let limiter = RateLimiter::new(2, 60);
        let t0 = 1_000_000;

        limiter.check_at("client", t0).unwrap();
        assert_eq!(limiter.sweep_idle_at(t0 + 30_000), 0);
        assert_eq!(limiter.tracked_clients(), 1);

        // The surviving window still enforces the limit
        limiter.check_at("client", t0 + 30_000).unwrap();
        assert!(limiter.check_at("client", t0 + 31_000).is_err());
    }

    #[test]
    fn test_window_fully_drains() {
        let limiter = RateLimiter::new(2, 10);
        let t0 = 1_000_000;

        assert!(limiter.check_at("client", t0).is_ok());
        assert!(limiter.check_at("client", t0 + 1000).is_ok());
        assert!(limiter.check_at("client", t0 + 2000).is_err());

        // Both timestamps aged out after the full window
        assert!(limiter.check_at("client", t0 + 11_000).is_ok());
        assert!(limiter.check_at("client", t0 + 11_000).is_ok());
    }
}
