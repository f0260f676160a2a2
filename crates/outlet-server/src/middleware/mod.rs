//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - [`RouterObservabilityExt`]: request ids and request tracing
//! - [`RouterRecoveryExt`]: timeouts and panic recovery
//! - [`RouterCorsExt`]: cross-origin access for browser clients

mod cors;
mod observability;
mod recovery;

pub use cors::{CorsConfig, RouterCorsExt};
pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
