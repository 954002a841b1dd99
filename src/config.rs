//! Configuration Module
//!
//! Handles loading and validating tier configuration from environment variables.

use std::env;

use crate::error::{Result, TierError};

// == Level Config ==
/// Capacity and default TTL for a single cache level.
#[derive(Debug, Clone, Copy)]
pub struct LevelConfig {
    /// Maximum number of entries the level can hold
    pub capacity: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
}

// == Config ==
/// Tier configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// L1 cache level (fastest, smallest, shortest TTL)
    pub l1: LevelConfig,
    /// L2 cache level
    pub l2: LevelConfig,
    /// L3 cache level (slowest, largest, longest TTL)
    pub l3: LevelConfig,
    /// Background expiry sweep interval in seconds
    pub sweep_interval: u64,
    /// Backend targets as (address, weight) pairs
    pub backends: Vec<(String, u32)>,
    /// Health check loop interval in seconds
    pub health_check_interval: u64,
    /// Per-probe timeout in milliseconds
    pub health_check_timeout_ms: u64,
    /// Outbound backend call timeout in milliseconds
    pub backend_timeout_ms: u64,
    /// Consecutive failures before a circuit opens
    pub fail_threshold: u32,
    /// Seconds an open circuit waits before allowing a probe
    pub reset_timeout: u64,
    /// Maximum requests per client within the rate window
    pub rate_limit: usize,
    /// Rate limiter window in seconds
    pub rate_window: u64,
    /// Number of worker tasks in the job pool
    pub worker_count: usize,
    /// Maximum queued jobs per priority lane
    pub queue_depth: usize,
    /// Seconds a completed/failed job is retained before the reaper purges it
    pub job_retention: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `L1_CAPACITY`/`L1_TTL` - L1 size and default TTL (default: 128 / 60)
    /// - `L2_CAPACITY`/`L2_TTL` - L2 size and default TTL (default: 512 / 300)
    /// - `L3_CAPACITY`/`L3_TTL` - L3 size and default TTL (default: 2048 / 3600)
    /// - `SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 10)
    /// - `BACKENDS` - Comma-separated `url=weight` list (default: empty)
    /// - `HEALTH_CHECK_INTERVAL` - Probe loop interval in seconds (default: 10)
    /// - `HEALTH_CHECK_TIMEOUT_MS` - Per-probe timeout (default: 2000)
    /// - `BACKEND_TIMEOUT_MS` - Outbound call timeout (default: 5000)
    /// - `FAIL_THRESHOLD` - Circuit breaker failure threshold (default: 5)
    /// - `RESET_TIMEOUT` - Circuit breaker reset timeout in seconds (default: 30)
    /// - `RATE_LIMIT`/`RATE_WINDOW` - Rate limiter bounds (default: 100 / 60)
    /// - `WORKER_COUNT` - Worker pool size (default: 3)
    /// - `QUEUE_DEPTH` - Per-lane job queue bound (default: 256)
    /// - `JOB_RETENTION` - Terminal job retention in seconds (default: 3600)
    pub fn from_env() -> Self {
        Self {
            server_port: env_or("SERVER_PORT", 3000),
            l1: LevelConfig {
                capacity: env_or("L1_CAPACITY", 128),
                default_ttl: env_or("L1_TTL", 60),
            },
            l2: LevelConfig {
                capacity: env_or("L2_CAPACITY", 512),
                default_ttl: env_or("L2_TTL", 300),
            },
            l3: LevelConfig {
                capacity: env_or("L3_CAPACITY", 2048),
                default_ttl: env_or("L3_TTL", 3600),
            },
            sweep_interval: env_or("SWEEP_INTERVAL", 10),
            backends: env::var("BACKENDS")
                .ok()
                .map(|v| parse_backends(&v))
                .unwrap_or_default(),
            health_check_interval: env_or("HEALTH_CHECK_INTERVAL", 10),
            health_check_timeout_ms: env_or("HEALTH_CHECK_TIMEOUT_MS", 2000),
            backend_timeout_ms: env_or("BACKEND_TIMEOUT_MS", 5000),
            fail_threshold: env_or("FAIL_THRESHOLD", 5),
            reset_timeout: env_or("RESET_TIMEOUT", 30),
            rate_limit: env_or("RATE_LIMIT", 100),
            rate_window: env_or("RATE_WINDOW", 60),
            worker_count: env_or("WORKER_COUNT", 3),
            queue_depth: env_or("QUEUE_DEPTH", 256),
            job_retention: env_or("JOB_RETENTION", 3600),
        }
    }

    /// Validates configuration invariants that would otherwise surface as
    /// runtime misbehavior.
    ///
    /// Zero cache capacity, a zero rate window, and an empty worker pool are
    /// all rejected at startup rather than tolerated.
    pub fn validate(&self) -> Result<()> {
        for (name, level) in [("L1", &self.l1), ("L2", &self.l2), ("L3", &self.l3)] {
            if level.capacity == 0 {
                return Err(TierError::InvalidRequest(format!(
                    "{} capacity must be greater than zero",
                    name
                )));
            }
        }
        if self.rate_limit == 0 || self.rate_window == 0 {
            return Err(TierError::InvalidRequest(
                "Rate limiter requires a non-zero limit and window".to_string(),
            ));
        }
        if self.worker_count == 0 {
            return Err(TierError::InvalidRequest(
                "Worker pool requires at least one worker".to_string(),
            ));
        }
        if self.fail_threshold == 0 {
            return Err(TierError::InvalidRequest(
                "Circuit breaker threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            l1: LevelConfig {
                capacity: 128,
                default_ttl: 60,
            },
            l2: LevelConfig {
                capacity: 512,
                default_ttl: 300,
            },
            l3: LevelConfig {
                capacity: 2048,
                default_ttl: 3600,
            },
            sweep_interval: 10,
            backends: Vec::new(),
            health_check_interval: 10,
            health_check_timeout_ms: 2000,
            backend_timeout_ms: 5000,
            fail_threshold: 5,
            reset_timeout: 30,
            rate_limit: 100,
            rate_window: 60,
            worker_count: 3,
            queue_depth: 256,
            job_retention: 3600,
        }
    }
}

// == Helpers ==
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses a `url=weight,url=weight` backend list.
///
/// Entries without a weight default to 1; malformed weights are skipped with
/// a warning rather than aborting startup.
fn parse_backends(raw: &str) -> Vec<(String, u32)> {
    raw.split(',')
        .filter_map(|item| {
            let item = item.trim();
            if item.is_empty() {
                return None;
            }
            match item.rsplit_once('=') {
                Some((url, weight)) => match weight.parse::<u32>() {
                    Ok(w) if w > 0 => Some((url.to_string(), w)),
                    _ => {
                        tracing::warn!("Skipping backend with invalid weight: {}", item);
                        None
                    }
                },
                None => Some((item.to_string(), 1)),
            }
        })
        .collect()
}
