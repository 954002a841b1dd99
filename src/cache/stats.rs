//! Cache Statistics Module
//!
//! Tracks per-level cache metrics: hits, misses, evictions, and expirations.

use serde::Serialize;

// == Level Stats ==
/// Performance counters for a single cache level.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LevelStats {
    /// Number of successful lookups at this level
    pub hits: u64,
    /// Number of lookups that missed at this level
    pub misses: u64,
    /// Number of entries evicted under capacity pressure
    pub evictions: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Current number of entries in the level
    pub entries: usize,
}

impl LevelStats {
    /// Creates a new LevelStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the hit rate, or 0.0 if the level has seen no lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn set_entries(&mut self, count: usize) {
        self.entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = LevelStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 0);
    }

    #[test]
    fn test_hit_rate_no_lookups() {
        let stats = LevelStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = LevelStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_record_eviction_and_expiration() {
        let mut stats = LevelStats::new();
        stats.record_eviction();
        stats.record_expiration();
        stats.record_expiration();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.expirations, 2);
    }
}
