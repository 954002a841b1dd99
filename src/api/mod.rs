//! API Module
//!
//! HTTP handlers and routing for the tier REST API.
//!
//! # Endpoints
//! - `PUT /store` - Store a key-value pair into the cache
//! - `GET /lookup/:key` - Look a key up through the cache levels
//! - `DELETE /invalidate/:key` - Remove a key from every level
//! - `GET /check/:client_id` - Standalone rate-limiter admission check
//! - `GET /fetch/:key` - Admitted, cached, routed backend fetch
//! - `GET /route` - One-off load-balancing decision
//! - `POST /jobs` / `GET /jobs/:id` / `DELETE /jobs/:id` - Job lifecycle
//! - `GET /stats` - Aggregated component statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
