//! Request DTOs for the tier API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{LevelSelector, MAX_KEY_LENGTH};
use crate::queue::Priority;
use crate::router::Strategy;

// == Store Request ==
/// Request body for the store operation (PUT /store)
#[derive(Debug, Clone, Deserialize)]
pub struct StoreRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in seconds; zero means "do not cache"
    #[serde(default)]
    pub ttl: Option<u64>,
    /// Target level: "L1", "L2", "L3", or "all" (default)
    #[serde(default)]
    pub level: Option<String>,
}

impl StoreRequest {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        if self.level_selector().is_none() {
            return Some(format!("Unknown cache level: {:?}", self.level));
        }
        None
    }

    /// Parses the level field, defaulting to all tiers.
    pub fn level_selector(&self) -> Option<LevelSelector> {
        match &self.level {
            None => Some(LevelSelector::All),
            Some(raw) => raw.parse().ok(),
        }
    }
}

// == Submit Job Request ==
/// Request body for job submission (POST /jobs)
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitJobRequest {
    /// Opaque job payload handed to the worker pool
    pub payload: Value,
    /// "high", "normal" (default), or "low"
    #[serde(default)]
    pub priority: Option<String>,
}

impl SubmitJobRequest {
    pub fn validate(&self) -> Option<String> {
        if self.parsed_priority().is_none() {
            return Some(format!("Unknown priority: {:?}", self.priority));
        }
        None
    }

    /// Parses the priority field, defaulting to NORMAL.
    pub fn parsed_priority(&self) -> Option<Priority> {
        match &self.priority {
            None => Some(Priority::Normal),
            Some(raw) => raw.parse().ok(),
        }
    }
}

// == Strategy Params ==
/// Query string for routed operations (GET /route, GET /fetch/:key)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyParams {
    /// Balancing strategy name; defaults to round robin
    #[serde(default)]
    pub strategy: Option<String>,
}

impl StrategyParams {
    pub fn parsed_strategy(&self) -> Option<Strategy> {
        match &self.strategy {
            None => Some(Strategy::RoundRobin),
            Some(raw) => raw.parse().ok(),
        }
    }
}
