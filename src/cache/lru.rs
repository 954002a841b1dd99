//! Access Order Module
//!
//! Tracks per-level key access order for least-recently-used eviction.

use std::collections::VecDeque;

// == Access Order ==
/// Tracks access recency for LRU eviction within a single cache level.
///
/// Keys live in a VecDeque with the most recently used key at the front and
/// the eviction victim at the back.
#[derive(Debug, Default)]
pub struct AccessOrder {
    order: VecDeque<String>,
}

impl AccessOrder {
    // == Constructor ==
    /// Creates a new empty access order.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Record Access ==
    /// Marks a key as most recently used, inserting it if new.
    pub fn record_access(&mut self, key: &str) {
        self.forget(key);
        self.order.push_front(key.to_string());
    }

    // == Forget ==
    /// Drops a key from the order (on invalidation or expiry).
    pub fn forget(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Take LRU ==
    /// Removes and returns the least recently used key, or None when empty.
    pub fn take_lru(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.order.len()
    }
}
