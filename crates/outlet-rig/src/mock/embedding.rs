//! Deterministic bag-of-words embedder.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use sha2::{Digest, Sha256};

use crate::provider::Embedder;
use crate::{Error, Result};

/// Default dimensionality of [`HashingEmbedder`] vectors.
pub const DEFAULT_MOCK_DIMENSIONS: usize = 4096;

#[derive(Debug, Default)]
struct Counters {
    batch_calls: AtomicUsize,
    query_calls: AtomicUsize,
    failing: AtomicBool,
}

/// Embeds text by hashing each distinct lowercase token into one dimension.
///
/// Texts sharing words score high, texts sharing none score zero. Clones
/// share call counters, so a test can keep one clone and hand the other to
/// the engine.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    ndims: usize,
    counters: Arc<Counters>,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_MOCK_DIMENSIONS)
    }
}

impl HashingEmbedder {
    /// Creates an embedder producing vectors of `ndims` dimensions.
    pub fn new(ndims: usize) -> Self {
        Self {
            ndims: ndims.max(1),
            counters: Arc::default(),
        }
    }

    /// Number of `embed_batch` calls so far.
    pub fn batch_calls(&self) -> usize {
        self.counters.batch_calls.load(Ordering::SeqCst)
    }

    /// Number of `embed` calls so far.
    pub fn query_calls(&self) -> usize {
        self.counters.query_calls.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.counters.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.counters.failing.load(Ordering::SeqCst) {
            return Err(Error::provider("mock", "embedding provider unavailable"));
        }
        Ok(())
    }

    fn vectorize(&self, text: &str) -> Vec<f64> {
        let tokens: BTreeSet<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
            .collect();

        let mut vector = vec![0.0; self.ndims];
        for token in tokens {
            let digest = Sha256::digest(token.as_bytes());
            let bucket = digest
                .iter()
                .take(8)
                .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
            vector[(bucket % self.ndims as u64) as usize] = 1.0;
        }
        vector
    }
}

#[async_trait::async_trait]
impl Embedder for HashingEmbedder {
    fn ndims(&self) -> usize {
        self.ndims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        self.counters.query_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>> {
        self.counters.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::cosine_similarity;

    #[tokio::test]
    async fn test_deterministic_and_case_insensitive() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("Menara UOA").await.unwrap();
        let b = embedder.embed("menara, uoa!").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_MOCK_DIMENSIONS);
    }

    #[tokio::test]
    async fn test_batch_is_index_aligned() {
        let embedder = HashingEmbedder::new(64);
        let texts = vec!["alpha".to_string(), "beta".to_string()];

        let batch = embedder.embed_batch(texts).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed("alpha").await.unwrap());
        assert_eq!(embedder.batch_calls(), 1);
        assert_eq!(embedder.query_calls(), 1);
    }

    #[tokio::test]
    async fn test_shared_words_score_higher() {
        let embedder = HashingEmbedder::default();
        let doc = embedder.embed("Subway Bangsar open Sunday").await.unwrap();
        let related = embedder.embed("Bangsar Sunday").await.unwrap();
        let unrelated = embedder.embed("pizza").await.unwrap();

        let related = cosine_similarity(&doc, &related).unwrap();
        let unrelated = cosine_similarity(&doc, &unrelated).unwrap();
        assert!(related > unrelated);
    }

    #[tokio::test]
    async fn test_failing() {
        let embedder = HashingEmbedder::default();
        embedder.set_failing(true);
        assert!(embedder.embed("x").await.is_err());
        assert!(embedder.embed_batch(vec!["x".into()]).await.is_err());
    }
}
