//! Cache Module
//!
//! Multi-level in-memory caching (L1/L2/L3) with TTL expiration, per-level
//! LRU eviction, and write-through promotion.

mod engine;
mod entry;
mod level;
mod lru;
mod stats;


// Re-export public types
pub use engine::{CacheEngine, CacheSnapshot, LevelSelector, Lookup};
pub use entry::{current_timestamp_ms, CacheEntry};
pub use level::{CacheLevel, Tier};
pub use lru::AccessOrder;
pub use stats::LevelStats;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
