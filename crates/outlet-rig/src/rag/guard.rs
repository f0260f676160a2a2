//! Lazy, single-flight construction of the vector store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use outlet_catalog::CatalogService;
use tokio::sync::Mutex;

use super::RetrievalEngine;
use crate::TRACING_TARGET;

/// Result of one build attempt, shared by every caller awaiting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The store was built with this many documents.
    Ready { documents: usize },
    /// The build failed; the store kept its previous contents.
    Failed { reason: String },
}

impl BuildOutcome {
    /// Returns `true` for a successful build.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

type InFlightBuild = Shared<BoxFuture<'static, BuildOutcome>>;

struct GuardInner {
    catalog: CatalogService,
    engine: RetrievalEngine,
    ready: AtomicBool,
    in_flight: Mutex<Option<InFlightBuild>>,
}

/// Ensures the vector store is built before it is queried.
///
/// The first call fetches the catalog and builds the store. Calls that
/// arrive while a build is running await that same build. Once a build
/// succeeds every later call returns immediately. A failed build is
/// reported and the next call starts a fresh attempt.
///
/// Builds run on their own task, so dropping a caller never cancels a
/// build that other callers are waiting on.
#[derive(Clone)]
pub struct InitializationGuard {
    inner: Arc<GuardInner>,
}

impl InitializationGuard {
    /// Creates a guard that builds `engine` from `catalog`.
    pub fn new(catalog: CatalogService, engine: RetrievalEngine) -> Self {
        let inner = GuardInner {
            catalog,
            engine,
            ready: AtomicBool::new(false),
            in_flight: Mutex::new(None),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns `true` once a build has succeeded.
    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }

    /// Returns the engine this guard initializes.
    pub fn engine(&self) -> &RetrievalEngine {
        &self.inner.engine
    }

    /// Number of documents currently indexed.
    pub async fn document_count(&self) -> usize {
        self.inner.engine.document_count().await
    }

    /// Builds the store if it is not ready yet.
    ///
    /// Returns `true` if the store is ready. On `false` the caller should
    /// continue in degraded mode: queries return empty results.
    pub async fn ensure_ready(&self) -> bool {
        if self.is_ready() {
            return true;
        }

        let build = {
            let mut slot = self.inner.in_flight.lock().await;
            if self.is_ready() {
                return true;
            }

            match slot.as_ref() {
                Some(build) => {
                    tracing::debug!(target: TRACING_TARGET, "Joining in-flight vector store build");
                    build.clone()
                }
                None => {
                    let build = Self::spawn_build(Arc::clone(&self.inner));
                    *slot = Some(build.clone());
                    build
                }
            }
        };

        build.await.is_ready()
    }

    fn spawn_build(inner: Arc<GuardInner>) -> InFlightBuild {
        let handle = tokio::spawn(async move {
            let outcome = Self::build(&inner).await;

            if outcome.is_ready() {
                inner.ready.store(true, Ordering::Release);
            }
            inner.in_flight.lock().await.take();

            outcome
        });

        async move {
            handle.await.unwrap_or_else(|error| BuildOutcome::Failed {
                reason: format!("build task failed: {error}"),
            })
        }
        .boxed()
        .shared()
    }

    async fn build(inner: &GuardInner) -> BuildOutcome {
        let started_at = Instant::now();
        tracing::info!(target: TRACING_TARGET, "Initializing vector store");

        let outlets = match inner.catalog.list_outlets().await {
            Ok(outlets) => outlets,
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Failed to fetch outlets, retrieval is degraded"
                );
                return BuildOutcome::Failed {
                    reason: error.to_string(),
                };
            }
        };

        match inner.engine.build(&outlets).await {
            Ok(documents) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    documents,
                    elapsed_ms = started_at.elapsed().as_millis(),
                    "Vector store initialized"
                );
                BuildOutcome::Ready { documents }
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Failed to build vector store, retrieval is degraded"
                );
                BuildOutcome::Failed {
                    reason: error.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for InitializationGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationGuard")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mock::{CountingCatalog, HashingEmbedder, sample_outlets};
    use crate::rag::RagConfig;

    fn guard(catalog: &CountingCatalog, embedder: &HashingEmbedder) -> InitializationGuard {
        let engine = RetrievalEngine::new(Arc::new(embedder.clone()), RagConfig::default());
        InitializationGuard::new(CatalogService::new(catalog.clone()), engine)
    }

    #[tokio::test]
    async fn test_ready_after_first_call() {
        let catalog = CountingCatalog::new(sample_outlets());
        let embedder = HashingEmbedder::default();
        let guard = guard(&catalog, &embedder);

        assert!(!guard.is_ready());
        assert!(guard.ensure_ready().await);
        assert!(guard.is_ready());
        assert_eq!(guard.document_count().await, 2);
    }

    #[tokio::test]
    async fn test_no_refetch_after_success() {
        let catalog = CountingCatalog::new(sample_outlets());
        let embedder = HashingEmbedder::default();
        let guard = guard(&catalog, &embedder);

        assert!(guard.ensure_ready().await);
        assert!(guard.ensure_ready().await);
        assert!(guard.ensure_ready().await);

        assert_eq!(catalog.list_calls(), 1);
        assert_eq!(embedder.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_one_build() {
        let catalog = CountingCatalog::new(sample_outlets()).with_delay(Duration::from_millis(50));
        let embedder = HashingEmbedder::default();
        let guard = guard(&catalog, &embedder);

        let results = futures::future::join_all((0..8).map(|_| {
            let guard = guard.clone();
            async move { guard.ensure_ready().await }
        }))
        .await;

        assert!(results.into_iter().all(|ready| ready));
        assert_eq!(catalog.list_calls(), 1);
        assert_eq!(embedder.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_degraded_then_retried() {
        let catalog = CountingCatalog::new(sample_outlets());
        let embedder = HashingEmbedder::default();
        let guard = guard(&catalog, &embedder);

        catalog.set_failing(true);
        assert!(!guard.ensure_ready().await);
        assert!(!guard.is_ready());
        assert_eq!(guard.document_count().await, 0);

        catalog.set_failing(false);
        assert!(guard.ensure_ready().await);
        assert_eq!(catalog.list_calls(), 2);
        assert_eq!(guard.document_count().await, 2);
    }

    #[tokio::test]
    async fn test_cancelled_caller_does_not_cancel_build() {
        let catalog = CountingCatalog::new(sample_outlets()).with_delay(Duration::from_millis(50));
        let embedder = HashingEmbedder::default();
        let guard = guard(&catalog, &embedder);

        let cancelled = {
            let guard = guard.clone();
            tokio::spawn(async move { guard.ensure_ready().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancelled.abort();

        assert!(guard.ensure_ready().await);
        assert_eq!(catalog.list_calls(), 1);
        assert_eq!(embedder.batch_calls(), 1);
    }
}
