//! Cross-origin access for browser chat clients.

use std::time::Duration;

use axum::Router;
use axum::http::Method;
use axum::http::header::{self, HeaderValue};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

/// Origins allowed when none are configured.
const DEVELOPMENT_ORIGINS: [&str; 5] = [
    "http://localhost:3000",
    "http://localhost:8080",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:8080",
    "http://localhost:5173",
];

/// Extension trait for `axum::`[`Router`] to apply CORS middleware.
pub trait RouterCorsExt<S> {
    /// Layers CORS rules built from the provided configuration.
    fn with_cors(self, config: &CorsConfig) -> Self;

    /// Layers CORS rules allowing local development origins.
    fn with_default_cors(self) -> Self;
}

impl<S> RouterCorsExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_cors(self, config: &CorsConfig) -> Self {
        let cors_layer = CorsLayer::new()
            .allow_origin(config.to_header_values())
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::CACHE_CONTROL])
            .allow_credentials(config.allow_credentials)
            .max_age(config.max_age());

        self.layer(cors_layer)
    }

    fn with_default_cors(self) -> Self {
        self.with_cors(&CorsConfig::default())
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct CorsConfig {
    /// List of allowed CORS origins.
    ///
    /// If empty, defaults to localhost origins for development.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_ORIGINS", value_delimiter = ',')
    )]
    pub allowed_origins: Vec<String>,

    /// Maximum age for CORS preflight requests in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_MAX_AGE", default_value = "3600")
    )]
    pub max_age_seconds: u64,

    /// Whether to allow credentials in CORS requests.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_ALLOW_CREDENTIALS", default_value = "false")
    )]
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_seconds: 3600,
            allow_credentials: false,
        }
    }
}

impl CorsConfig {
    /// Returns the CORS max age as a Duration.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    /// Converts configured origins to header values.
    ///
    /// Falls back to localhost origins when none are configured. Origins
    /// that are not valid header values are skipped.
    pub fn to_header_values(&self) -> Vec<HeaderValue> {
        if self.allowed_origins.is_empty() {
            return DEVELOPMENT_ORIGINS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect();
        }

        self.allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect()
    }
}
