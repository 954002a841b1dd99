//! Admission Control Module
//!
//! The first gate every inbound request passes: a sliding-window rate
//! limiter per client identity and a circuit breaker per backend dependency.

mod circuit;
mod rate_limiter;

pub use circuit::{CircuitBreaker, CircuitSnapshot, CircuitState};
pub use rate_limiter::RateLimiter;
