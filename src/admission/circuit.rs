//! Circuit Breaker Module
//!
//! Per-backend-dependency protective state machine:
//!
//! ```text
//! CLOSED → OPEN       failure_count reaches fail_threshold
//! OPEN → HALF_OPEN    next acquire after reset_timeout (admitted as the probe)
//! HALF_OPEN → CLOSED  probe succeeds (failure count reset)
//! HALF_OPEN → OPEN    probe fails (last failure reset)
//! ```
//!
//! Keeps a struggling backend from being hammered by retries while still
//! detecting recovery automatically.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Result, TierError};

// == Circuit State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

// == Circuit ==
#[derive(Debug)]
struct Circuit {
    failure_count: u32,
    state: CircuitState,
    last_failure_at: Option<Instant>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            failure_count: 0,
            state: CircuitState::Closed,
            last_failure_at: None,
        }
    }
}

// == Circuit Snapshot ==
/// Serializable view of one dependency's circuit for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitSnapshot {
    pub dependency: String,
    pub state: CircuitState,
    pub failure_count: u32,
}

// == Circuit Breaker ==
/// One circuit per backend dependency, held in a concurrent map so updates
/// for different dependencies never contend.
#[derive(Debug)]
pub struct CircuitBreaker {
    fail_threshold: u32,
    reset_timeout: Duration,
    circuits: DashMap<String, Circuit>,
}

impl CircuitBreaker {
    // == Constructor ==
    pub fn new(fail_threshold: u32, reset_timeout_secs: u64) -> Self {
        Self {
            fail_threshold,
            reset_timeout: Duration::from_secs(reset_timeout_secs),
            circuits: DashMap::new(),
        }
    }

    // == Try Acquire ==
    /// Decides whether a request may reach the dependency.
    ///
    /// In OPEN, requests are short-circuited until the reset timeout elapses;
    /// the first acquire after that flips the circuit to HALF_OPEN and is
    /// admitted as the single probe. Further acquires while the probe is
    /// outstanding are short-circuited.
    pub fn try_acquire(&self, dependency: &str) -> Result<()> {
        self.try_acquire_at(dependency, Instant::now())
    }

    /// Clock-explicit form of `try_acquire` for deterministic tests.
    pub fn try_acquire_at(&self, dependency: &str, now: Instant) -> Result<()> {
        let mut circuit = self.circuits.entry(dependency.to_string()).or_default();

        match circuit.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => Err(TierError::CircuitOpen(dependency.to_string())),
            CircuitState::Open => {
                let elapsed = circuit
                    .last_failure_at
                    .map(|at| now.saturating_duration_since(at))
                    .unwrap_or(Duration::ZERO);

                if elapsed > self.reset_timeout {
                    circuit.state = CircuitState::HalfOpen;
                    info!(dependency, "Circuit half-open, admitting probe request");
                    Ok(())
                } else {
                    Err(TierError::CircuitOpen(dependency.to_string()))
                }
            }
        }
    }

    // == Record Success ==
    /// Records a successful call: closes a half-open circuit and resets the
    /// consecutive-failure count.
    pub fn record_success(&self, dependency: &str) {
        let mut circuit = self.circuits.entry(dependency.to_string()).or_default();

        if circuit.state == CircuitState::HalfOpen {
            info!(dependency, "Probe succeeded, closing circuit");
        }
        circuit.state = CircuitState::Closed;
        circuit.failure_count = 0;
    }

    // == Record Failure ==
    /// Records a failed call, opening the circuit at the threshold or on a
    /// failed half-open probe.
    pub fn record_failure(&self, dependency: &str) {
        self.record_failure_at(dependency, Instant::now());
    }

    /// Clock-explicit form of `record_failure` for deterministic tests.
    pub fn record_failure_at(&self, dependency: &str, now: Instant) {
        let mut circuit = self.circuits.entry(dependency.to_string()).or_default();

        circuit.failure_count += 1;
        circuit.last_failure_at = Some(now);

        match circuit.state {
            CircuitState::HalfOpen => {
                warn!(dependency, "Probe failed, reopening circuit");
                circuit.state = CircuitState::Open;
            }
            CircuitState::Closed if circuit.failure_count >= self.fail_threshold => {
                warn!(
                    dependency,
                    failures = circuit.failure_count,
                    "Failure threshold reached, opening circuit"
                );
                circuit.state = CircuitState::Open;
            }
            _ => {}
        }
    }

    // == Observability ==
    /// Current state for a dependency (CLOSED if never seen).
    pub fn state(&self, dependency: &str) -> CircuitState {
        self.circuits
            .get(dependency)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Per-dependency snapshot for the stats endpoint.
    pub fn snapshot(&self) -> Vec<CircuitSnapshot> {
        self.circuits
            .iter()
            .map(|entry| CircuitSnapshot {
                dependency: entry.key().clone(),
                state: entry.state,
                failure_count: entry.failure_count,
            })
            .collect()
    }
}
