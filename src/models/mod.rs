//! Request and Response models for the tier API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{StoreRequest, StrategyParams, SubmitJobRequest};
pub use responses::{
    CancelResponse, CheckResponse, HealthResponse, InvalidateResponse, LookupResponse,
    RouteResponse, StatsResponse, StoreResponse, SubmitResponse,
};
