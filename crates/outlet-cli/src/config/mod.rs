//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig          # Host, port, shutdown
//! ├── middleware: MiddlewareConfig  # CORS, request timeout
//! ├── catalog: CatalogConfig        # Remote catalog or local file
//! ├── provider: ProviderConfig      # OpenAI key and models
//! ├── agent: AgentConfig            # Step budget
//! └── rag: RagConfig                # top-k and similarity threshold
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod catalog;
mod middleware;
mod provider;
mod server;

use std::process;

use anyhow::{Context, anyhow};
use clap::{Parser, ValueEnum};
pub use catalog::CatalogConfig;
pub use middleware::MiddlewareConfig;
use outlet_rig::chat::AgentConfig;
use outlet_rig::provider::ProviderConfig;
use outlet_rig::rag::RagConfig;
pub use provider::create_chat_service;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "outlet-assistant")]
#[command(about = "Conversational assistant answering questions about retail outlets")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Outlet catalog source.
    #[clap(flatten)]
    pub catalog: CatalogConfig,

    /// Embedding and completion provider configuration.
    #[clap(flatten)]
    pub provider: ProviderConfig,

    /// Agent loop configuration.
    #[clap(flatten)]
    pub agent: AgentConfig,

    /// Retrieval configuration.
    #[clap(flatten)]
    pub rag: RagConfig,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    #[serde(default)]
    pub log_format: LogFormat,

    /// Build the outlet index at startup instead of on the first conversation.
    #[arg(long, env = "EAGER_INDEX", default_value_t = false)]
    #[serde(default)]
    pub eager_index: bool,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments, so its values
    /// act as defaults for the `env` fallbacks.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// The level comes from `RUST_LOG` and defaults to `info`.
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .map_err(|e| anyhow!("failed to create env filter: {e}"))?;

        let registry = tracing_subscriber::registry().with(filter);
        let result = match self.log_format {
            LogFormat::Text => registry
                .with(fmt::layer().with_target(true).with_ansi(true))
                .try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_target(true))
                .try_init(),
        };

        result.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.middleware
            .validate()
            .context("invalid middleware configuration")?;
        self.catalog
            .validate()
            .context("invalid catalog configuration")?;
        self.agent.validate().context("invalid agent configuration")?;
        self.rag.validate().context("invalid retrieval configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();
        self.middleware.log();
        self.catalog.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            completion_model = %self.provider.completion_model,
            embedding_model = %self.provider.embedding_model,
            embedding_dimensions = self.provider.embedding_dimensions,
            api_key_set = self.provider.openai_api_key.is_some(),
            "Provider configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            max_steps = self.agent.max_steps,
            top_k = self.rag.top_k,
            min_similarity = self.rag.min_similarity,
            eager_index = self.eager_index,
            "Agent configuration"
        );
    }

    /// Logs build information.
    fn log_build_info() {
        tracing::info!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            "starting outlet assistant"
        );

        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "build information"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "dotenv").then_some("dotenv"),
            cfg!(feature = "mock").then_some("mock"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
