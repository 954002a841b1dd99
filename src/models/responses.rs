//! Response DTOs for the tier API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use uuid::Uuid;

use crate::admission::CircuitSnapshot;
use crate::cache::CacheSnapshot;
use crate::queue::{JobStatus, Priority, QueueSnapshot};
use crate::router::TargetSnapshot;

// == Check Response ==
/// Response body for an admitted request (GET /check/:client_id).
/// A rejection is the 429 error body instead.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    pub client_id: String,
    pub allowed: bool,
}

impl CheckResponse {
    pub fn allowed(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            allowed: true,
        }
    }
}

// == Lookup Response ==
/// Response body for the lookup operation (GET /lookup/:key).
///
/// A miss is a normal 200 response with `hit=false`.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResponse {
    pub key: String,
    pub hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl LookupResponse {
    pub fn hit(key: impl Into<String>, value: impl Into<String>, level: &str) -> Self {
        Self {
            key: key.into(),
            hit: true,
            value: Some(value.into()),
            level: Some(level.to_string()),
        }
    }

    pub fn miss(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            hit: false,
            value: None,
            level: None,
        }
    }
}

// == Store Response ==
/// Response body for the store operation (PUT /store)
#[derive(Debug, Clone, Serialize)]
pub struct StoreResponse {
    pub message: String,
    pub key: String,
}

impl StoreResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' stored successfully", key),
            key,
        }
    }
}

// == Invalidate Response ==
/// Response body for the invalidate operation (DELETE /invalidate/:key)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub key: String,
    /// True if the key existed in at least one level
    pub removed: bool,
}

impl InvalidateResponse {
    pub fn new(key: impl Into<String>, removed: bool) -> Self {
        Self {
            key: key.into(),
            removed,
        }
    }
}

// == Route Response ==
/// Response body for a one-off routing decision (GET /route)
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    /// Address of the selected backend
    pub target: String,
}

// == Submit Response ==
/// Response body for job submission (POST /jobs)
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub id: Uuid,
    pub priority: Priority,
    pub status: JobStatus,
}

// == Cancel Response ==
/// Response body for job cancellation (DELETE /jobs/:id)
#[derive(Debug, Clone, Serialize)]
pub struct CancelResponse {
    pub id: Uuid,
    /// False when the job had already been picked up by a worker
    pub cancelled: bool,
}

// == Stats Response ==
/// Read-only observability snapshot (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheSnapshot,
    pub backends: Vec<TargetSnapshot>,
    pub circuits: Vec<CircuitSnapshot>,
    pub queues: QueueSnapshot,
}

// == Health Response ==
/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
