//! Job Module
//!
//! Defines the asynchronous job record and its priority/status enums.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::cache::current_timestamp_ms;

// == Priority ==
/// Queue lane for a job. Workers drain lanes in strict priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Priority {
    /// Lane index, ordered highest priority first.
    pub fn lane(&self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Normal => 1,
            Priority::Low => 2,
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            _ => Err(()),
        }
    }
}

// == Job Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// A terminal job is eligible for retention-based purging.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

// == Job ==
/// A unit of offloaded work. Created on submission and mutated only by the
/// worker executing it (or by a pre-start cancellation).
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub priority: Priority,
    pub payload: Value,
    pub status: JobStatus,
    /// Unix milliseconds
    pub submitted_at: u64,
    pub started_at: Option<u64>,
    pub completed_at: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl Job {
    // == Constructor ==
    pub fn new(payload: Value, priority: Priority) -> Self {
        Self {
            id: Uuid::new_v4(),
            priority,
            payload,
            status: JobStatus::Queued,
            submitted_at: current_timestamp_ms(),
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }
}
