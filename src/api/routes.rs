//! API Routes
//!
//! Configures the Axum router with all tier endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cancel_job_handler, check_handler, fetch_handler, health_handler, invalidate_handler,
    job_status_handler, lookup_handler, route_handler, stats_handler, store_handler,
    submit_job_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /store` - Store a key-value pair into the cache
/// - `GET /lookup/:key` - Look a key up through the cache levels
/// - `DELETE /invalidate/:key` - Remove a key from every level
/// - `GET /check/:client_id` - Standalone rate-limiter admission check
/// - `GET /fetch/:key` - Admitted, cached, routed backend fetch
/// - `GET /route` - One-off load-balancing decision
/// - `POST /jobs` - Submit a background job
/// - `GET /jobs/:id` - Poll a job record
/// - `DELETE /jobs/:id` - Best-effort job cancellation
/// - `GET /stats` - Aggregated component statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/store", put(store_handler))
        .route("/lookup/:key", get(lookup_handler))
        .route("/invalidate/:key", delete(invalidate_handler))
        .route("/check/:client_id", get(check_handler))
        .route("/fetch/:key", get(fetch_handler))
        .route("/route", get(route_handler))
        .route("/jobs", post(submit_job_handler))
        .route("/jobs/:id", get(job_status_handler).delete(cancel_job_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
