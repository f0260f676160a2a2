#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use outlet_rig::chat::ChatService;
use outlet_server::handler::routes;
use outlet_server::middleware::{RouterCorsExt, RouterObservabilityExt, RouterRecoveryExt};
use outlet_server::service::ServiceState;

use crate::config::{Cli, MiddlewareConfig, create_chat_service};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "outlet_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "outlet_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "outlet_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = format!("{error:#}"),
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    cli.init_tracing().context("failed to initialize tracing")?;
    cli.log();
    cli.validate()?;

    let chat_service = create_chat_service(&cli).context("failed to create chat service")?;
    if cli.eager_index {
        warm_up(&chat_service).await;
    }

    let guard = chat_service.guard().clone();
    let state = ServiceState::new(chat_service);
    let router = create_router(state, &cli.middleware);

    server::serve(router, cli.server, guard).await?;

    Ok(())
}

/// Builds the outlet index before the first request arrives.
///
/// A failed build is not fatal: the first conversation retries it.
async fn warm_up(chat_service: &ChatService) {
    tracing::info!(target: TRACING_TARGET_SERVER_STARTUP, "building outlet index");

    if chat_service.warm_up().await {
        tracing::info!(
            target: TRACING_TARGET_SERVER_STARTUP,
            documents = chat_service.guard().document_count().await,
            "outlet index ready"
        );
    } else {
        tracing::warn!(
            target: TRACING_TARGET_SERVER_STARTUP,
            "outlet index unavailable, retrying on first conversation"
        );
    }
}

/// Creates the router with all middleware layers applied.
///
/// Middleware is applied in reverse order (last added = outermost):
/// 1. Recovery (outermost) - catches panics and enforces timeouts
/// 2. Observability - request IDs and tracing spans
/// 3. CORS
/// 4. Routes (innermost) - actual request handlers
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    routes()
        .with_state(state)
        .with_cors(&middleware.cors)
        .with_observability()
        .with_recovery(&middleware.recovery)
}
