//! Cache Level Module
//!
//! A single bounded cache tier combining HashMap storage with LRU eviction
//! and TTL expiration. Levels are composed into the multi-level engine.

use std::collections::HashMap;

use serde::Serialize;

use crate::cache::{AccessOrder, CacheEntry, LevelStats};

// == Tier ==
/// Identifies a cache level, ordered fastest/smallest to slowest/largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    L1,
    L2,
    L3,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::L1 => "L1",
            Tier::L2 => "L2",
            Tier::L3 => "L3",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "L1" => Ok(Tier::L1),
            "L2" => Ok(Tier::L2),
            "L3" => Ok(Tier::L3),
            _ => Err(()),
        }
    }
}

// == Cache Level ==
/// One bounded tier of the cache.
///
/// Invariant: `len() <= capacity` at all times; eviction runs before an
/// insertion would exceed capacity.
#[derive(Debug)]
pub struct CacheLevel {
    tier: Tier,
    entries: HashMap<String, CacheEntry>,
    order: AccessOrder,
    stats: LevelStats,
    capacity: usize,
    default_ttl: u64,
}

impl CacheLevel {
    // == Constructor ==
    /// Creates a new level. Capacity must be non-zero; the configuration
    /// layer rejects zero before a level is ever built.
    pub fn new(tier: Tier, capacity: usize, default_ttl: u64) -> Self {
        Self {
            tier,
            entries: HashMap::new(),
            order: AccessOrder::new(),
            stats: LevelStats::new(),
            capacity,
            default_ttl,
        }
    }

    // == Get ==
    /// Retrieves a value by key, updating access metadata on a hit.
    ///
    /// An expired entry is removed on access and counted as an expiration
    /// plus a miss, so stale data is never returned.
    pub fn get(&mut self, key: &str) -> Option<String> {
        match self.entries.get_mut(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.order.forget(key);
                self.stats.record_expiration();
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                entry.touch();
                let value = entry.value.clone();
                self.order.record_access(key);
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a key-value pair.
    ///
    /// A TTL of zero means "do not cache": any existing entry for the key is
    /// removed and nothing is stored. `None` falls back to the level's
    /// default TTL. If the level is at capacity and the key is new, the
    /// least-recently-used entry is evicted first.
    pub fn set(&mut self, key: &str, value: String, ttl: Option<u64>) {
        if ttl == Some(0) {
            self.invalidate(key);
            return;
        }

        let is_overwrite = self.entries.contains_key(key);

        if !is_overwrite && self.entries.len() >= self.capacity {
            if let Some(victim) = self.order.take_lru() {
                self.entries.remove(&victim);
                self.stats.record_eviction();
            }
        }

        let effective_ttl = ttl.unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(value, Some(effective_ttl));
        self.entries.insert(key.to_string(), entry);
        self.order.record_access(key);
    }

    // == Invalidate ==
    /// Removes an entry by key. Returns true if the key was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.forget(key);
            true
        } else {
            false
        }
    }

    // == Sweep Expired ==
    /// Removes all expired entries, independent of capacity pressure.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.order.forget(key);
            self.stats.record_expiration();
        }

        expired_keys.len()
    }

    // == Accessors ==
    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a stats snapshot with the current entry count filled in.
    pub fn stats(&self) -> LevelStats {
        let mut stats = self.stats.clone();
        stats.set_entries(self.entries.len());
        stats
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    fn level(capacity: usize) -> CacheLevel {
        CacheLevel::new(Tier::L1, capacity, 300)
    }

    #[test]
    fn test_set_and_get() {
        let mut l = level(10);

        l.set("k", "v".to_string(), None);
        assert_eq!(l.get("k"), Some("v".to_string()));
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn test_get_missing_records_miss() {
        let mut l = level(10);

        assert_eq!(l.get("missing"), None);
        assert_eq!(l.stats().misses, 1);
    }

    #[test]
    fn test_overwrite_keeps_single_entry() {
        let mut l = level(10);

        l.set("k", "v1".to_string(), None);
        l.set("k", "v2".to_string(), None);

        assert_eq!(l.get("k"), Some("v2".to_string()));
        assert_eq!(l.len(), 1);
    }

    #[test]
    fn test_zero_ttl_means_do_not_cache() {
        let mut l = level(10);

        l.set("k", "v1".to_string(), None);
        l.set("k", "v2".to_string(), Some(0));

        assert_eq!(l.get("k"), None);
        assert_eq!(l.len(), 0);
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let mut l = level(3);

        l.set("k1", "v1".to_string(), None);
        l.set("k2", "v2".to_string(), None);
        l.set("k3", "v3".to_string(), None);
        l.set("k4", "v4".to_string(), None);

        assert_eq!(l.len(), 3);
        assert_eq!(l.get("k1"), None);
        assert!(l.get("k4").is_some());
        assert_eq!(l.stats().evictions, 1);
    }

    #[test]
    fn test_get_refreshes_lru_position() {
        let mut l = level(3);

        l.set("k1", "v1".to_string(), None);
        l.set("k2", "v2".to_string(), None);
        l.set("k3", "v3".to_string(), None);

        // k1 becomes most recent, so k2 is the next victim
        l.get("k1");
        l.set("k4", "v4".to_string(), None);

        assert!(l.get("k1").is_some());
        assert_eq!(l.get("k2"), None);
    }

    #[test]
    fn test_expired_entry_removed_on_access() {
        let mut l = level(10);

        l.set("k", "v".to_string(), Some(1));
        sleep(Duration::from_millis(1100));

        assert_eq!(l.get("k"), None);
        assert_eq!(l.len(), 0);
        assert_eq!(l.stats().expirations, 1);
    }

    #[test]
    fn test_sweep_expired() {
        let mut l = level(10);

        l.set("short", "v".to_string(), Some(1));
        l.set("long", "v".to_string(), Some(60));
        sleep(Duration::from_millis(1100));

        let removed = l.sweep_expired();
        assert_eq!(removed, 1);
        assert_eq!(l.len(), 1);
        assert!(l.get("long").is_some());
    }

    #[test]
    fn test_invalidate() {
        let mut l = level(10);

        l.set("k", "v".to_string(), None);
        assert!(l.invalidate("k"));
        assert!(!l.invalidate("k"));
        assert_eq!(l.len(), 0);
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!("l2".parse::<Tier>(), Ok(Tier::L2));
        assert!("L4".parse::<Tier>().is_err());
    }
}
