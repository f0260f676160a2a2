//! HTTP server startup.

use std::future::IntoFuture;
use std::io;

use axum::Router;
use outlet_rig::rag::InitializationGuard;
use tokio::net::TcpListener;

use super::lifecycle::serve_with_shutdown;
use super::{Result, ServerError, Shutdown};
use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};

/// Starts an HTTP server with graceful shutdown.
///
/// `guard` is only read to report the index state when a shutdown signal
/// arrives.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the address cannot be
/// bound, or the server stops with an I/O error.
pub async fn serve_http(
    app: Router,
    server_config: ServerConfig,
    guard: InitializationGuard,
) -> Result<()> {
    if let Err(validation_error) = server_config.validate() {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            error = %validation_error,
            "Invalid server configuration"
        );

        return Err(ServerError::InvalidConfig(validation_error.to_string()));
    }

    let server_addr = server_config.server_addr();
    let listener = TcpListener::bind(server_addr).await.map_err(|source| {
        tracing::error!(
            target: TRACING_TARGET_SERVER_STARTUP,
            addr = %server_addr,
            error = %source,
            "Failed to bind to address"
        );

        ServerError::Bind {
            address: server_addr.to_string(),
            source,
        }
    })?;

    let shutdown = Shutdown::new(server_config.shutdown_timeout());
    tokio::spawn(shutdown.clone().listen(guard));

    serve_with_shutdown(&server_config, || serve_until_shutdown(listener, app, shutdown)).await?;

    Ok(())
}

/// Serves `app` until `shutdown` is triggered and open connections drain.
///
/// Connections still open when the drain deadline passes are dropped.
async fn serve_until_shutdown(listener: TcpListener, app: Router, shutdown: Shutdown) -> io::Result<()> {
    let signal = shutdown.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { signal.triggered().await })
        .into_future();

    tokio::select! {
        result = server => result,
        () = shutdown.deadline() => {
            tracing::warn!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                timeout_secs = shutdown.timeout().as_secs(),
                "Shutdown timeout elapsed, closing open chat streams"
            );
            Ok(())
        }
    }
}
