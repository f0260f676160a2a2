//! Graceful shutdown of the assistant server.
//!
//! A [`Shutdown`] is triggered by SIGTERM or Ctrl+C. Once triggered the
//! server stops accepting connections and waits for open chat streams, but
//! only for the configured shutdown timeout: a conversation turn can stream
//! for a long time and must not hold the process open indefinitely.

use std::sync::Arc;
use std::time::Duration;

use outlet_rig::rag::InitializationGuard;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;
use tokio::sync::watch;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;

/// Shared shutdown trigger with a drain deadline.
///
/// Clones observe the same trigger.
#[derive(Debug, Clone)]
pub struct Shutdown {
    triggered: Arc<watch::Sender<bool>>,
    timeout: Duration,
}

impl Shutdown {
    /// Creates an untriggered shutdown that drains for at most `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let (triggered, _) = watch::channel(false);
        Self {
            triggered: Arc::new(triggered),
            timeout,
        }
    }

    /// Maximum time open connections get to finish after the trigger.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Starts the shutdown. Later calls have no effect.
    pub fn trigger(&self) {
        self.triggered.send_replace(true);
    }

    /// Resolves once the shutdown is triggered.
    pub async fn triggered(&self) {
        let mut receiver = self.triggered.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Resolves when the drain period after the trigger has elapsed.
    pub async fn deadline(&self) {
        self.triggered().await;
        tokio::time::sleep(self.timeout).await;
    }

    /// Triggers the shutdown on SIGTERM (Unix) or Ctrl+C.
    ///
    /// The index state is logged so an operator can tell whether the
    /// process ever served retrieval results.
    pub async fn listen(self, guard: InitializationGuard) {
        tokio::select! {
            signal = os_signal() => {
                let documents = guard.document_count().await;
                tracing::info!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    signal,
                    index_ready = guard.is_ready(),
                    documents,
                    timeout_secs = self.timeout.as_secs(),
                    "Received shutdown signal, draining open chat streams"
                );
                self.trigger();
            }
            () = self.triggered() => {}
        }
    }
}

/// Waits for the first termination signal and returns its name.
async fn os_signal() -> &'static str {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => "ctrl_c",
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %error,
                    "Failed to install Ctrl+C handler"
                );
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                "sigterm"
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %error,
                    "Failed to install SIGTERM handler"
                );
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        signal = ctrl_c => signal,
        signal = terminate => signal,
    }
}
