//! Embedding provider abstraction.

use std::sync::Arc;

use rig::embeddings::EmbeddingModel as RigEmbeddingModel;
use rig::prelude::EmbeddingsClient;
use rig::providers::openai;

use super::ProviderConfig;
use crate::{Error, Result, TRACING_TARGET};

/// Converts text to fixed-length vectors.
///
/// `embed_batch` must return one vector per input, index-aligned, all of
/// length [`Embedder::ndims`].
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Dimensionality of produced vectors.
    fn ndims(&self) -> usize;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;

    /// Embeds many texts in one provider call.
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>>;
}

/// Embedding provider backed by rig's OpenAI client.
///
/// This is a cheaply cloneable wrapper around an `Arc<EmbeddingService>`.
#[derive(Clone)]
pub struct EmbeddingProvider(Arc<EmbeddingService>);

struct EmbeddingService {
    model: openai::EmbeddingModel,
    model_name: String,
    ndims: usize,
}

impl EmbeddingProvider {
    /// Creates an OpenAI embedding provider from configuration.
    pub fn openai(config: &ProviderConfig) -> Result<Self> {
        let client =
            openai::Client::new(config.api_key()?).map_err(|e| Error::provider("openai", e))?;
        let model = client
            .embedding_model_with_ndims(&config.embedding_model, config.embedding_dimensions);

        tracing::debug!(
            target: TRACING_TARGET,
            model = %config.embedding_model,
            ndims = config.embedding_dimensions,
            "Created embedding provider"
        );

        Ok(Self(Arc::new(EmbeddingService {
            model,
            model_name: config.embedding_model.clone(),
            ndims: config.embedding_dimensions,
        })))
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        &self.0.model_name
    }
}

#[async_trait::async_trait]
impl Embedder for EmbeddingProvider {
    fn ndims(&self) -> usize {
        self.0.ndims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let embedding = RigEmbeddingModel::embed_text(&self.0.model, text)
            .await
            .map_err(|e| Error::provider("openai", e))?;

        Ok(embedding.vec)
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>> {
        let count = texts.len();
        let embeddings = RigEmbeddingModel::embed_texts(&self.0.model, texts)
            .await
            .map_err(|e| Error::provider("openai", e))?;

        tracing::debug!(
            target: TRACING_TARGET,
            model = %self.0.model_name,
            requested = count,
            received = embeddings.len(),
            "Embedded document batch"
        );

        Ok(embeddings.into_iter().map(|e| e.vec).collect())
    }
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider::OpenAi")
            .field("model", &self.0.model_name)
            .field("ndims", &self.0.ndims)
            .finish()
    }
}
