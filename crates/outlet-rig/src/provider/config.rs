//! Provider configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default chat completion model.
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Output dimensionality of the default embedding model.
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// Configuration for the OpenAI-backed providers.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ProviderConfig {
    /// OpenAI API key
    #[cfg_attr(
        feature = "config",
        arg(long = "openai-api-key", env = "OPENAI_API_KEY", hide_env_values = true)
    )]
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// Chat completion model name
    #[cfg_attr(
        feature = "config",
        arg(long = "completion-model", env = "COMPLETION_MODEL", default_value = DEFAULT_COMPLETION_MODEL)
    )]
    #[serde(default = "default_completion_model")]
    pub completion_model: String,

    /// Embedding model name
    #[cfg_attr(
        feature = "config",
        arg(long = "embedding-model", env = "EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)
    )]
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding vector dimensionality
    #[cfg_attr(
        feature = "config",
        arg(long = "embedding-dimensions", env = "EMBEDDING_DIMENSIONS", default_value = "1536")
    )]
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
}

fn default_completion_model() -> String {
    DEFAULT_COMPLETION_MODEL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embedding_dimensions() -> usize {
    DEFAULT_EMBEDDING_DIMENSIONS
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            completion_model: default_completion_model(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("completion_model", &self.completion_model)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimensions", &self.embedding_dimensions)
            .finish()
    }
}

impl ProviderConfig {
    /// Returns the API key, or a configuration error if it is missing or blank.
    pub fn api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::config("OPENAI_API_KEY is not set"))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        self.api_key()?;

        if self.completion_model.trim().is_empty() {
            return Err(Error::config("completion model name cannot be empty"));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(Error::config("embedding model name cannot be empty"));
        }
        if self.embedding_dimensions == 0 {
            return Err(Error::config("embedding dimensions must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.completion_model, "gpt-4o");
        assert_eq!(config.embedding_dimensions, 1536);
        assert!(config.api_key().is_err());
    }

    #[test]
    fn test_blank_key_is_rejected() {
        let config = ProviderConfig {
            openai_api_key: Some("   ".to_string()),
            ..ProviderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let config = ProviderConfig {
            openai_api_key: Some("sk-secret".to_string()),
            ..ProviderConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
