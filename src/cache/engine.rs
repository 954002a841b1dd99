//! Cache Engine Module
//!
//! Multi-level cache engine composing three bounded levels (L1/L2/L3) with
//! write-through promotion on slower-tier hits.
//!
//! Each level sits behind its own mutex, so same-key operations within a
//! level are linearizable while the levels never contend with each other. A
//! lock is always released before the next level's lock is taken.

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{CacheLevel, LevelStats, Tier, MAX_KEY_LENGTH, MAX_VALUE_SIZE};
use crate::config::LevelConfig;
use crate::error::{Result, TierError};

// == Level Selector ==
/// Chooses which level(s) a `set` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSelector {
    /// Replicate across every tier, each with its own default TTL
    All,
    /// Write to a single tier only
    One(Tier),
}

impl LevelSelector {
    fn includes(&self, tier: Tier) -> bool {
        match self {
            LevelSelector::All => true,
            LevelSelector::One(t) => *t == tier,
        }
    }
}

impl std::str::FromStr for LevelSelector {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(LevelSelector::All)
        } else {
            s.parse::<Tier>().map(LevelSelector::One)
        }
    }
}

// == Lookup ==
/// A successful cache lookup: the value and the tier it was found at.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub value: String,
    pub tier: Tier,
}

// == Cache Snapshot ==
/// Read-only stats snapshot across all levels.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub l1: LevelStats,
    pub l2: LevelStats,
    pub l3: LevelStats,
}

// == Cache Engine ==
/// Three-tier cache with L1-first lookup and promotion.
#[derive(Debug)]
pub struct CacheEngine {
    l1: Mutex<CacheLevel>,
    l2: Mutex<CacheLevel>,
    l3: Mutex<CacheLevel>,
}

impl CacheEngine {
    // == Constructor ==
    pub fn new(l1: LevelConfig, l2: LevelConfig, l3: LevelConfig) -> Self {
        Self {
            l1: Mutex::new(CacheLevel::new(Tier::L1, l1.capacity, l1.default_ttl)),
            l2: Mutex::new(CacheLevel::new(Tier::L2, l2.capacity, l2.default_ttl)),
            l3: Mutex::new(CacheLevel::new(Tier::L3, l3.capacity, l3.default_ttl)),
        }
    }

    // == Get ==
    /// Looks a key up through L1, then L2, then L3.
    ///
    /// A hit at a slower tier is promoted into every faster tier with the
    /// faster tier's own default TTL before the value is returned. A miss at
    /// all levels returns None; misses are never errors.
    pub async fn get(&self, key: &str) -> Option<Lookup> {
        if let Some(value) = self.l1.lock().await.get(key) {
            return Some(Lookup {
                value,
                tier: Tier::L1,
            });
        }

        if let Some(value) = self.l2.lock().await.get(key) {
            self.l1.lock().await.set(key, value.clone(), None);
            debug!(key, from = "L2", "Promoted cache entry");
            return Some(Lookup {
                value,
                tier: Tier::L2,
            });
        }

        if let Some(value) = self.l3.lock().await.get(key) {
            self.l1.lock().await.set(key, value.clone(), None);
            self.l2.lock().await.set(key, value.clone(), None);
            debug!(key, from = "L3", "Promoted cache entry");
            return Some(Lookup {
                value,
                tier: Tier::L3,
            });
        }

        None
    }

    // == Set ==
    /// Stores a key-value pair into the selected level(s).
    ///
    /// With `LevelSelector::All` and no explicit TTL, each tier applies its
    /// own default TTL. A TTL of zero acts as an invalidation of the key in
    /// the targeted level(s).
    pub async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<u64>,
        selector: LevelSelector,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(TierError::InvalidRequest("Key cannot be empty".to_string()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(TierError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(TierError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if selector.includes(Tier::L1) {
            self.l1.lock().await.set(key, value.clone(), ttl);
        }
        if selector.includes(Tier::L2) {
            self.l2.lock().await.set(key, value.clone(), ttl);
        }
        if selector.includes(Tier::L3) {
            self.l3.lock().await.set(key, value, ttl);
        }

        Ok(())
    }

    // == Invalidate ==
    /// Removes a key from every level, guaranteeing no stale reads after a
    /// mutation. Returns true if the key was present anywhere.
    pub async fn invalidate(&self, key: &str) -> bool {
        let in_l1 = self.l1.lock().await.invalidate(key);
        let in_l2 = self.l2.lock().await.invalidate(key);
        let in_l3 = self.l3.lock().await.invalidate(key);
        in_l1 || in_l2 || in_l3
    }

    // == Sweep Expired ==
    /// Removes expired entries from every level. Returns the total removed.
    pub async fn sweep_expired(&self) -> usize {
        let mut removed = self.l1.lock().await.sweep_expired();
        removed += self.l2.lock().await.sweep_expired();
        removed += self.l3.lock().await.sweep_expired();
        removed
    }

    // == Stats ==
    /// Returns a per-level stats snapshot.
    pub async fn stats(&self) -> CacheSnapshot {
        CacheSnapshot {
            l1: self.l1.lock().await.stats(),
            l2: self.l2.lock().await.stats(),
            l3: self.l3.lock().await.stats(),
        }
    }
}
