//! Retrieval over the outlet catalog.
//!
//! - [`RetrievalEngine`] turns outlets into documents, embeds them in a
//!   single batch and answers similarity queries
//! - [`VectorStore`] holds the current immutable [`Snapshot`]
//! - [`InitializationGuard`] builds the store lazily, once, for all callers

mod config;
mod document;
mod guard;
mod similarity;
mod vector_store;

use std::sync::Arc;

pub use config::{DEFAULT_MIN_SIMILARITY, DEFAULT_TOP_K, RagConfig};
pub use document::{OutletDocument, SimilarityResult, StoredDocument};
pub use guard::{BuildOutcome, InitializationGuard};
use outlet_catalog::Outlet;
pub use similarity::cosine_similarity;
pub use vector_store::{Snapshot, VectorStore};

use crate::provider::Embedder;
use crate::{Error, Result, TRACING_TARGET};

struct RetrievalEngineInner {
    embedder: Arc<dyn Embedder>,
    store: VectorStore,
    config: RagConfig,
}

/// Builds and queries the outlet vector store.
#[derive(Clone)]
pub struct RetrievalEngine {
    inner: Arc<RetrievalEngineInner>,
}

impl RetrievalEngine {
    /// Creates an engine with an empty store.
    pub fn new(embedder: Arc<dyn Embedder>, config: RagConfig) -> Self {
        let inner = RetrievalEngineInner {
            embedder,
            store: VectorStore::new(),
            config,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns the retrieval configuration.
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &VectorStore {
        &self.inner.store
    }

    /// Number of documents currently indexed.
    pub async fn document_count(&self) -> usize {
        self.inner.store.len().await
    }

    /// Replaces the index with documents built from `outlets`.
    ///
    /// All documents are embedded in one batch. If embedding fails or the
    /// provider returns the wrong number of vectors, the previous snapshot
    /// is left untouched.
    pub async fn build(&self, outlets: &[Outlet]) -> Result<usize> {
        let documents: Vec<OutletDocument> = outlets.iter().map(OutletDocument::from_outlet).collect();

        if documents.is_empty() {
            tracing::warn!(target: TRACING_TARGET, "Building vector store from an empty catalog");
            return self.inner.store.install(Vec::new()).await;
        }

        let contents: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let embeddings = self.inner.embedder.embed_batch(contents).await?;

        if embeddings.len() != documents.len() {
            return Err(Error::embedding(format!(
                "provider returned {} vectors for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        let stored = documents
            .into_iter()
            .zip(embeddings)
            .map(|(document, embedding)| StoredDocument {
                document,
                embedding,
            })
            .collect();

        let count = self.inner.store.install(stored).await?;

        tracing::info!(
            target: TRACING_TARGET,
            documents = count,
            "Vector store built"
        );

        Ok(count)
    }

    /// Queries the index using the configured `top_k` and threshold.
    pub async fn query(&self, text: &str) -> Result<Vec<SimilarityResult>> {
        let RagConfig {
            top_k,
            min_similarity,
        } = self.inner.config;
        self.query_with(text, top_k, min_similarity).await
    }

    /// Queries the index with explicit limits.
    ///
    /// An empty index answers with no results and does not call the embedder.
    pub async fn query_with(
        &self,
        text: &str,
        top_k: usize,
        min_similarity: f64,
    ) -> Result<Vec<SimilarityResult>> {
        let snapshot = self.inner.store.snapshot().await;
        if snapshot.is_empty() {
            tracing::debug!(target: TRACING_TARGET, "Query against empty vector store");
            return Ok(Vec::new());
        }

        let query = self.inner.embedder.embed(text).await?;
        let results = snapshot.rank(&query, top_k, min_similarity)?;

        tracing::debug!(
            target: TRACING_TARGET,
            query_len = text.len(),
            top_k,
            min_similarity,
            results = results.len(),
            top_similarity = results.first().map(|r| r.similarity),
            "Vector store queried"
        );

        Ok(results)
    }
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("config", &self.inner.config)
            .field("ndims", &self.inner.embedder.ndims())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{HashingEmbedder, sample_outlets};

    fn engine(embedder: &HashingEmbedder) -> RetrievalEngine {
        RetrievalEngine::new(
            Arc::new(embedder.clone()),
            RagConfig::default().with_min_similarity(0.2),
        )
    }

    #[tokio::test]
    async fn test_build_embeds_every_outlet_once() {
        let embedder = HashingEmbedder::default();
        let engine = engine(&embedder);
        let outlets = sample_outlets();

        let count = engine.build(&outlets).await.unwrap();
        assert_eq!(count, outlets.len());
        assert_eq!(embedder.batch_calls(), 1);

        let snapshot = engine.store().snapshot().await;
        assert_eq!(snapshot.len(), outlets.len());
        assert!(
            snapshot
                .documents()
                .iter()
                .all(|d| d.embedding.len() == embedder.ndims())
        );
    }

    #[tokio::test]
    async fn test_name_query_ranks_outlet_first() {
        let embedder = HashingEmbedder::default();
        let engine = engine(&embedder);
        engine.build(&sample_outlets()).await.unwrap();

        let results = engine.query("Menara UOA Bangsar").await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].metadata.name, "Subway Menara UOA Bangsar");
        assert!(results[0].similarity >= 0.2);
    }

    #[tokio::test]
    async fn test_hours_query_ranks_outlet_first() {
        let embedder = HashingEmbedder::default();
        let engine = engine(&embedder);
        engine.build(&sample_outlets()).await.unwrap();

        let results = engine.query("open on Sunday 8 AM").await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].metadata.name, "Subway Menara UOA Bangsar");
    }

    #[tokio::test]
    async fn test_unrelated_query_is_empty() {
        let embedder = HashingEmbedder::default();
        let engine = engine(&embedder);
        engine.build(&sample_outlets()).await.unwrap();

        let results = engine.query("pizza hut restaurants").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_scores_bounded_and_sorted() {
        let embedder = HashingEmbedder::default();
        let engine = engine(&embedder);
        engine.build(&sample_outlets()).await.unwrap();

        let results = engine.query_with("Subway Kuala Lumpur", 10, -1.0).await.unwrap();
        assert_eq!(results.len(), sample_outlets().len());
        assert!(results.iter().all(|r| (-1.0..=1.0).contains(&r.similarity)));
        assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[tokio::test]
    async fn test_empty_store_skips_embedding() {
        let embedder = HashingEmbedder::default();
        let engine = engine(&embedder);

        let results = engine.query("anything").await.unwrap();
        assert!(results.is_empty());
        assert_eq!(embedder.query_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_catalog_builds_empty_store() {
        let embedder = HashingEmbedder::default();
        let engine = engine(&embedder);

        assert_eq!(engine.build(&[]).await.unwrap(), 0);
        assert_eq!(embedder.batch_calls(), 0);
        assert_eq!(engine.document_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_build_keeps_previous_snapshot() {
        let embedder = HashingEmbedder::default();
        let engine = engine(&embedder);
        let outlets = sample_outlets();
        engine.build(&outlets[..1]).await.unwrap();

        embedder.set_failing(true);
        assert!(engine.build(&outlets).await.is_err());
        assert_eq!(engine.document_count().await, 1);

        embedder.set_failing(false);
        let results = engine.query("Menara UOA Bangsar").await.unwrap();
        assert_eq!(results[0].metadata.id, 1);
    }
}
