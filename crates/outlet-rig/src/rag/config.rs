//! Retrieval configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default number of results returned by a query.
pub const DEFAULT_TOP_K: usize = 5;

/// Default minimum cosine similarity for a result to be returned.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.5;

/// Configuration for retrieval queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct RagConfig {
    /// Maximum number of results per semantic search
    #[cfg_attr(
        feature = "config",
        arg(long = "rag-top-k", env = "RAG_TOP_K", default_value = "5")
    )]
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a result to be kept
    #[cfg_attr(
        feature = "config",
        arg(long = "rag-min-similarity", env = "RAG_MIN_SIMILARITY", default_value = "0.5")
    )]
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_min_similarity() -> f64 {
    DEFAULT_MIN_SIMILARITY
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_similarity: DEFAULT_MIN_SIMILARITY,
        }
    }
}

impl RagConfig {
    /// Sets the maximum number of results.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets the similarity threshold.
    #[must_use]
    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.top_k == 0 {
            return Err(crate::Error::config("top_k must be greater than 0"));
        }
        if !(-1.0..=1.0).contains(&self.min_similarity) {
            return Err(crate::Error::config(
                "min_similarity must be within [-1.0, 1.0]",
            ));
        }
        Ok(())
    }
}
