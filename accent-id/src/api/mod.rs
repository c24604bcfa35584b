//! HTTP API handlers for accent-id

pub mod classify;
pub mod health;

pub use classify::{classify_routes, ClassifyResponse, CLASSIFY_ROUTE};
pub use health::{health_routes, HealthResponse};
