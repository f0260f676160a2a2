//! In-memory vector store with atomic snapshot replacement.

use std::sync::Arc;

use tokio::sync::RwLock;

use super::document::{SimilarityResult, StoredDocument};
use super::similarity::cosine_similarity;
use crate::{Error, Result, TRACING_TARGET};

/// An immutable set of embedded documents.
///
/// All embeddings in a snapshot share the same dimensionality.
#[derive(Debug, Default)]
pub struct Snapshot {
    documents: Vec<StoredDocument>,
    ndims: usize,
}

impl Snapshot {
    /// Creates a snapshot, rejecting documents with inconsistent dimensionality.
    pub fn new(documents: Vec<StoredDocument>) -> Result<Self> {
        let ndims = documents.first().map_or(0, |d| d.embedding.len());

        if !documents.is_empty() && ndims == 0 {
            return Err(Error::embedding("received empty embedding vectors"));
        }
        if let Some(position) = documents.iter().position(|d| d.embedding.len() != ndims) {
            return Err(Error::embedding(format!(
                "document {position} has {} dimensions, expected {ndims}",
                documents[position].embedding.len()
            )));
        }

        Ok(Self { documents, ndims })
    }

    /// Documents in insertion order.
    pub fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }

    /// Embedding dimensionality, or `0` for an empty snapshot.
    pub fn ndims(&self) -> usize {
        self.ndims
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if the snapshot holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Ranks documents against a query vector.
    ///
    /// Results are sorted by descending similarity; ties keep insertion
    /// order. Results below `min_similarity` are dropped and at most `top_k`
    /// are returned.
    pub fn rank(
        &self,
        query: &[f64],
        top_k: usize,
        min_similarity: f64,
    ) -> Result<Vec<SimilarityResult>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored = Vec::with_capacity(self.documents.len());
        for stored in &self.documents {
            let similarity = cosine_similarity(query, &stored.embedding).ok_or_else(|| {
                Error::retrieval(format!(
                    "query has {} dimensions, store has {}",
                    query.len(),
                    self.ndims
                ))
            })?;
            scored.push((stored, similarity));
        }

        // `sort_by` is stable, so equal scores stay in insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .filter(|(_, similarity)| *similarity >= min_similarity)
            .take(top_k)
            .map(|(stored, similarity)| SimilarityResult {
                content: stored.document.content.clone(),
                metadata: stored.document.metadata.clone(),
                similarity,
            })
            .collect())
    }
}

/// Shared handle to the current snapshot.
///
/// Readers clone the `Arc` of the current snapshot and never block a
/// rebuild for longer than the pointer swap.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    current: Arc<RwLock<Arc<Snapshot>>>,
}

impl VectorStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// Replaces the current snapshot with `documents`.
    ///
    /// On error the previous snapshot stays in place.
    pub async fn install(&self, documents: Vec<StoredDocument>) -> Result<usize> {
        let snapshot = Arc::new(Snapshot::new(documents)?);
        let count = snapshot.len();
        let ndims = snapshot.ndims();

        *self.current.write().await = snapshot;

        tracing::debug!(
            target: TRACING_TARGET,
            documents = count,
            ndims,
            "Installed vector store snapshot"
        );

        Ok(count)
    }

    /// Number of documents in the current snapshot.
    pub async fn len(&self) -> usize {
        self.current.read().await.len()
    }

    /// Returns `true` if the current snapshot holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.current.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use outlet_catalog::Outlet;

    use super::*;
    use crate::rag::OutletDocument;

    fn stored(id: i64, embedding: Vec<f64>) -> StoredDocument {
        let outlet = Outlet::new(id, format!("Outlet {id}"), "Somewhere");
        StoredDocument {
            document: OutletDocument::from_outlet(&outlet),
            embedding,
        }
    }

    fn ids(results: &[SimilarityResult]) -> Vec<i64> {
        results.iter().map(|r| r.metadata.id).collect()
    }

    #[test]
    fn test_snapshot_rejects_mixed_dimensions() {
        let result = Snapshot::new(vec![stored(1, vec![1.0, 0.0]), stored(2, vec![1.0])]);
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[test]
    fn test_rank_sorted_with_stable_ties() {
        let snapshot = Snapshot::new(vec![
            stored(1, vec![0.0, 1.0]),
            stored(2, vec![1.0, 0.0]),
            stored(3, vec![2.0, 0.0]),
            stored(4, vec![1.0, 1.0]),
        ])
        .unwrap();

        let results = snapshot.rank(&[1.0, 0.0], 10, -1.0).unwrap();
        assert_eq!(ids(&results), vec![2, 3, 4, 1]);
        assert!(results.iter().all(|r| (-1.0..=1.0).contains(&r.similarity)));
        assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_rank_threshold_and_top_k() {
        let snapshot = Snapshot::new(vec![
            stored(1, vec![1.0, 0.0]),
            stored(2, vec![1.0, 1.0]),
            stored(3, vec![0.0, 1.0]),
            stored(4, vec![-1.0, 0.0]),
        ])
        .unwrap();

        let results = snapshot.rank(&[1.0, 0.0], 10, 0.5).unwrap();
        assert_eq!(ids(&results), vec![1, 2]);

        let results = snapshot.rank(&[1.0, 0.0], 1, -1.0).unwrap();
        assert_eq!(ids(&results), vec![1]);
    }

    #[test]
    fn test_rank_dimension_mismatch() {
        let snapshot = Snapshot::new(vec![stored(1, vec![1.0, 0.0])]).unwrap();
        assert!(snapshot.rank(&[1.0, 0.0, 0.0], 5, 0.0).is_err());
    }

    #[tokio::test]
    async fn test_failed_install_keeps_previous_snapshot() {
        let store = VectorStore::new();
        assert!(store.is_empty().await);

        store
            .install(vec![stored(1, vec![1.0, 0.0]), stored(2, vec![0.0, 1.0])])
            .await
            .unwrap();
        let before = store.snapshot().await;

        let result = store
            .install(vec![stored(3, vec![1.0, 0.0]), stored(4, vec![1.0])])
            .await;
        assert!(result.is_err());

        let after = store.snapshot().await;
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_readers_keep_old_snapshot_across_swap() {
        let store = VectorStore::new();
        store.install(vec![stored(1, vec![1.0])]).await.unwrap();

        let held = store.snapshot().await;
        store
            .install(vec![stored(2, vec![1.0]), stored(3, vec![1.0])])
            .await
            .unwrap();

        assert_eq!(held.len(), 1);
        assert_eq!(store.len().await, 2);
    }
}
