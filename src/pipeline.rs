//! Request Pipeline Module
//!
//! The synchronous fetch path as an explicit ordered list of stages, each
//! with a single `handle` contract: admission check, cache lookup, then the
//! routed backend fetch. Composition lives in the stage list, not in nested
//! wrappers, so the order is visible in one place.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::admission::{CircuitBreaker, RateLimiter};
use crate::cache::{CacheEngine, LevelSelector};
use crate::error::{Result, TierError};
use crate::router::{Router, Strategy};

// == Fetch Request ==
/// One synchronous read moving through the pipeline.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub client_id: String,
    pub key: String,
    pub strategy: Strategy,
}

// == Fetch Outcome ==
/// The resolved value plus where it came from (a cache tier or a backend).
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    pub key: String,
    pub value: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
}

// == Stage Flow ==
/// What a stage decided: pass the request on, or respond.
pub enum StageFlow {
    Continue,
    Done(FetchOutcome),
}

// == Stage ==
/// One capability in the request path.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, request: &FetchRequest) -> Result<StageFlow>;
}

// == Pipeline ==
/// Ordered stage list driven front to back.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// The standard tier composition: admission, cache, backend fetch.
    pub fn standard(
        limiter: Arc<RateLimiter>,
        cache: Arc<CacheEngine>,
        router: Arc<Router>,
        breaker: Arc<CircuitBreaker>,
        client: reqwest::Client,
        backend_timeout_ms: u64,
    ) -> Self {
        Self::new(vec![
            Box::new(AdmissionStage { limiter }),
            Box::new(CacheLookupStage { cache: cache.clone() }),
            Box::new(BackendFetchStage {
                router,
                breaker,
                cache,
                client,
                timeout: Duration::from_millis(backend_timeout_ms),
            }),
        ])
    }

    // == Run ==
    /// Drives the request through each stage in order until one responds.
    pub async fn run(&self, request: FetchRequest) -> Result<FetchOutcome> {
        for stage in &self.stages {
            debug!(stage = stage.name(), key = %request.key, "Pipeline stage");
            match stage.handle(&request).await? {
                StageFlow::Done(outcome) => return Ok(outcome),
                StageFlow::Continue => {}
            }
        }

        // The fetch stage always resolves or errors; reaching here is a bug
        Err(TierError::Internal(
            "Pipeline exhausted without a response".to_string(),
        ))
    }
}

// == Admission Stage ==
/// Rejects over-limit clients before they consume anything downstream.
pub struct AdmissionStage {
    pub limiter: Arc<RateLimiter>,
}

#[async_trait]
impl Stage for AdmissionStage {
    fn name(&self) -> &'static str {
        "admission"
    }

    async fn handle(&self, request: &FetchRequest) -> Result<StageFlow> {
        self.limiter.check(&request.client_id)?;
        Ok(StageFlow::Continue)
    }
}

// == Cache Lookup Stage ==
/// Resolves from the cache engine; a miss falls through to routing.
pub struct CacheLookupStage {
    pub cache: Arc<CacheEngine>,
}

#[async_trait]
impl Stage for CacheLookupStage {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn handle(&self, request: &FetchRequest) -> Result<StageFlow> {
        match self.cache.get(&request.key).await {
            Some(lookup) => Ok(StageFlow::Done(FetchOutcome {
                key: request.key.clone(),
                value: lookup.value,
                source: lookup.tier.as_str().to_string(),
                backend: None,
            })),
            None => Ok(StageFlow::Continue),
        }
    }
}

// == Backend Fetch Stage ==
/// Routes to a healthy backend, guarded by the per-target circuit, and
/// populates the cache with the response.
pub struct BackendFetchStage {
    pub router: Arc<Router>,
    pub breaker: Arc<CircuitBreaker>,
    pub cache: Arc<CacheEngine>,
    pub client: reqwest::Client,
    pub timeout: Duration,
}

#[async_trait]
impl Stage for BackendFetchStage {
    fn name(&self) -> &'static str {
        "backend"
    }

    async fn handle(&self, request: &FetchRequest) -> Result<StageFlow> {
        // Guard scope covers the whole call, so the connection count is
        // released on every exit path
        let guard = self.router.select(request.strategy)?;
        let address = guard.address.clone();

        self.breaker.try_acquire(&address)?;

        let url = format!("{}/data/{}", address, request.key);
        let response = self.client.get(&url).timeout(self.timeout).send().await;

        let value = match response {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => body,
                Err(err) => {
                    self.breaker.record_failure(&address);
                    return Err(TierError::BackendError(format!("{}: {}", address, err)));
                }
            },
            Ok(resp) => {
                self.breaker.record_failure(&address);
                return Err(TierError::BackendError(format!(
                    "{} returned {}",
                    address,
                    resp.status()
                )));
            }
            Err(err) if err.is_timeout() => {
                self.breaker.record_failure(&address);
                return Err(TierError::BackendTimeout(address));
            }
            Err(err) => {
                self.breaker.record_failure(&address);
                return Err(TierError::BackendError(format!("{}: {}", address, err)));
            }
        };

        self.breaker.record_success(&address);
        self.cache
            .set(&request.key, value.clone(), None, LevelSelector::All)
            .await?;

        Ok(StageFlow::Done(FetchOutcome {
            key: request.key.clone(),
            value,
            source: "backend".to_string(),
            backend: Some(address),
        }))
    }
}
