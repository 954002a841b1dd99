//! API Handlers
//!
//! HTTP request handlers for each tier endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use uuid::Uuid;

use crate::admission::{CircuitBreaker, RateLimiter};
use crate::cache::CacheEngine;
use crate::config::Config;
use crate::error::{Result, TierError};
use crate::models::{
    CancelResponse, CheckResponse, HealthResponse, InvalidateResponse, LookupResponse,
    RouteResponse, StatsResponse, StoreRequest, StoreResponse, StrategyParams, SubmitJobRequest,
    SubmitResponse,
};
use crate::pipeline::{FetchOutcome, FetchRequest, Pipeline};
use crate::queue::JobQueue;
use crate::router::Router;

/// Client identity header consulted by the admitted fetch path
const CLIENT_ID_HEADER: &str = "x-client-id";

/// Application state shared across all handlers.
///
/// Every component is behind an Arc so the state clones cheaply per request.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheEngine>,
    pub router: Arc<Router>,
    pub limiter: Arc<RateLimiter>,
    pub breaker: Arc<CircuitBreaker>,
    pub queue: Arc<JobQueue>,
    pub pipeline: Arc<Pipeline>,
    /// Shared outbound client, reused by health probes and backend fetches
    pub http: reqwest::Client,
}

impl AppState {
    /// Creates the full component graph from configuration.
    pub fn from_config(config: &Config) -> Self {
        let cache = Arc::new(CacheEngine::new(config.l1, config.l2, config.l3));
        let router = Arc::new(Router::new(&config.backends));
        let limiter = Arc::new(RateLimiter::new(config.rate_limit, config.rate_window));
        let breaker = Arc::new(CircuitBreaker::new(
            config.fail_threshold,
            config.reset_timeout,
        ));
        let queue = Arc::new(JobQueue::new(config.queue_depth));
        let http = reqwest::Client::new();

        let pipeline = Arc::new(Pipeline::standard(
            limiter.clone(),
            cache.clone(),
            router.clone(),
            breaker.clone(),
            http.clone(),
            config.backend_timeout_ms,
        ));

        Self {
            cache,
            router,
            limiter,
            breaker,
            queue,
            pipeline,
            http,
        }
    }
}

/// Handler for PUT /store
///
/// Stores a key-value pair into the selected cache level(s) with optional TTL.
pub async fn store_handler(
    State(state): State<AppState>,
    Json(req): Json<StoreRequest>,
) -> Result<Json<StoreResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(TierError::InvalidRequest(error_msg));
    }
    // validate() guarantees the selector parses
    let selector = req
        .level_selector()
        .ok_or_else(|| TierError::InvalidRequest("Unknown cache level".to_string()))?;

    state.cache.set(&req.key, req.value, req.ttl, selector).await?;

    Ok(Json(StoreResponse::new(req.key)))
}

/// Handler for GET /lookup/:key
///
/// Looks a key up through the cache levels. A miss is a normal 200 response
/// with `hit=false`, never an error.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<LookupResponse> {
    match state.cache.get(&key).await {
        Some(lookup) => Json(LookupResponse::hit(key, lookup.value, lookup.tier.as_str())),
        None => Json(LookupResponse::miss(key)),
    }
}

/// Handler for DELETE /invalidate/:key
///
/// Removes a key from every cache level.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate(&key).await;
    Json(InvalidateResponse::new(key, removed))
}

/// Handler for GET /check/:client_id
///
/// Standalone admission check against the sliding-window rate limiter. An
/// admitted request counts toward the client's quota; a rejection is a 429.
pub async fn check_handler(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<CheckResponse>> {
    state.limiter.check(&client_id)?;
    Ok(Json(CheckResponse::allowed(client_id)))
}

/// Handler for GET /fetch/:key
///
/// The full request path: admission, cache lookup, then a routed backend
/// fetch. The client identity comes from the `X-Client-Id` header.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<StrategyParams>,
    headers: HeaderMap,
) -> Result<Json<FetchOutcome>> {
    let strategy = params
        .parsed_strategy()
        .ok_or_else(|| TierError::InvalidRequest("Unknown balancing strategy".to_string()))?;

    let client_id = headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();

    let outcome = state
        .pipeline
        .run(FetchRequest {
            client_id,
            key,
            strategy,
        })
        .await?;

    Ok(Json(outcome))
}

/// Handler for GET /route
///
/// One-off routing decision: selects a healthy backend with the requested
/// strategy and reports its address. The connection slot is released as soon
/// as the handler returns.
pub async fn route_handler(
    State(state): State<AppState>,
    Query(params): Query<StrategyParams>,
) -> Result<Json<RouteResponse>> {
    let strategy = params
        .parsed_strategy()
        .ok_or_else(|| TierError::InvalidRequest("Unknown balancing strategy".to_string()))?;

    let guard = state.router.select(strategy)?;
    Ok(Json(RouteResponse {
        target: guard.address.clone(),
    }))
}

/// Handler for POST /jobs
///
/// Submits a job to the priority queue and returns its id immediately.
pub async fn submit_job_handler(
    State(state): State<AppState>,
    Json(req): Json<SubmitJobRequest>,
) -> Result<Json<SubmitResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(TierError::InvalidRequest(error_msg));
    }
    let priority = req
        .parsed_priority()
        .ok_or_else(|| TierError::InvalidRequest("Unknown priority".to_string()))?;

    let id = state.queue.submit(req.payload, priority)?;
    let job = state.queue.status(id)?;

    Ok(Json(SubmitResponse {
        id,
        priority,
        status: job.status,
    }))
}

/// Handler for GET /jobs/:id
///
/// Returns the current job record, including the result or error once the
/// job reached a terminal status.
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<crate::queue::Job>> {
    let job = state.queue.status(id)?;
    Ok(Json(job))
}

/// Handler for DELETE /jobs/:id
///
/// Best-effort cancellation; a job already picked up by a worker runs to
/// completion and the response says so.
pub async fn cancel_job_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancelResponse>> {
    let cancelled = state.queue.cancel(id)?;
    Ok(Json(CancelResponse { id, cancelled }))
}

/// Handler for GET /stats
///
/// Aggregated observability snapshot across all components.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        cache: state.cache.stats().await,
        backends: state.router.snapshot(),
        circuits: state.breaker.snapshot(),
        queues: state.queue.depths(),
    })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{JobStatus, Priority};
    use serde_json::json;

    fn state() -> AppState {
        AppState::from_config(&Config::default())
    }

    #[tokio::test]
    async fn test_store_and_lookup_handler() {
        let state = state();

        let req = StoreRequest {
            key: "test_key".to_string(),
            value: "test_value".to_string(),
            ttl: None,
            level: None,
        };
        let result = store_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let response =
            lookup_handler(State(state.clone()), Path("test_key".to_string())).await;
        assert!(response.hit);
        assert_eq!(response.value.as_deref(), Some("test_value"));
        assert_eq!(response.level.as_deref(), Some("L1"));
    }

    #[tokio::test]
    async fn test_lookup_miss_is_not_an_error() {
        let state = state();

        let response = lookup_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(!response.hit);
        assert!(response.value.is_none());
    }

    #[tokio::test]
    async fn test_store_invalid_request() {
        let state = state();

        let req = StoreRequest {
            key: "".to_string(), // Empty key is invalid
            value: "value".to_string(),
            ttl: None,
            level: None,
        };
        let result = store_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(TierError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_invalidate_handler() {
        let state = state();

        let req = StoreRequest {
            key: "to_delete".to_string(),
            value: "value".to_string(),
            ttl: None,
            level: None,
        };
        store_handler(State(state.clone()), Json(req)).await.unwrap();

        let response =
            invalidate_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(response.removed);

        let response = lookup_handler(State(state), Path("to_delete".to_string())).await;
        assert!(!response.hit);
    }

    #[tokio::test]
    async fn test_check_handler_rejects_over_limit() {
        let config = Config {
            rate_limit: 2,
            ..Config::default()
        };
        let state = AppState::from_config(&config);

        for _ in 0..2 {
            assert!(check_handler(State(state.clone()), Path("c".to_string()))
                .await
                .is_ok());
        }
        let result = check_handler(State(state), Path("c".to_string())).await;
        assert!(matches!(result, Err(TierError::AdmissionRejected(_))));
    }

    #[tokio::test]
    async fn test_route_handler_without_backends() {
        let state = state();

        let result = route_handler(State(state), Query(StrategyParams::default())).await;
        assert!(matches!(result, Err(TierError::NoHealthyBackend)));
    }

    #[tokio::test]
    async fn test_route_handler_rejects_unknown_strategy() {
        let state = state();

        let params = StrategyParams {
            strategy: Some("fastest".to_string()),
        };
        let result = route_handler(State(state), Query(params)).await;
        assert!(matches!(result, Err(TierError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_submit_and_status_handler() {
        let state = state();

        let req = SubmitJobRequest {
            payload: json!({"echo": 1}),
            priority: Some("high".to_string()),
        };
        let response = submit_job_handler(State(state.clone()), Json(req))
            .await
            .unwrap();
        assert_eq!(response.priority, Priority::High);
        assert_eq!(response.status, JobStatus::Queued);

        let job = job_status_handler(State(state), Path(response.id))
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn test_job_status_unknown_id() {
        let state = state();

        let result = job_status_handler(State(state), Path(Uuid::new_v4())).await;
        assert!(matches!(result, Err(TierError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_queued_job_handler() {
        let state = state();

        let req = SubmitJobRequest {
            payload: json!({}),
            priority: None,
        };
        let submitted = submit_job_handler(State(state.clone()), Json(req))
            .await
            .unwrap();

        let response = cancel_job_handler(State(state), Path(submitted.id))
            .await
            .unwrap();
        assert!(response.cancelled);
    }

    #[tokio::test]
    async fn test_stats_handler_shape() {
        let state = state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.cache.l1.hits, 0);
        assert!(response.backends.is_empty());
        assert!(response.circuits.is_empty());
        assert_eq!(response.queues.high, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
