//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod chat;
mod error;
mod health;
mod response;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::chat::{ChatMessageRequest, ChatRequest, ChatRole};
pub use crate::handler::error::{Error, ErrorKind, Result};
pub use crate::handler::response::{ErrorResponse, HealthResponse, HealthStatus};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a [`Router`] with all routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .merge(chat::routes())
        .merge(health::routes())
        .fallback(handler)
}
