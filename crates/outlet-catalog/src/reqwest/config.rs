//! Reqwest client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default base URL of the catalog service.
pub const DEFAULT_CATALOG_URL: &str = "http://localhost:8000/api";

/// Configuration for the catalog HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Base URL of the outlet catalog service
    #[cfg_attr(
        feature = "config",
        arg(long = "catalog-url", env = "CATALOG_URL", default_value = DEFAULT_CATALOG_URL)
    )]
    #[serde(default = "default_catalog_url")]
    pub catalog_url: Url,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_catalog_url() -> Url {
    Url::parse(DEFAULT_CATALOG_URL).expect("default catalog URL is valid")
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            http_timeout: default_timeout_secs(),
            user_agent: None,
        }
    }
}

impl ReqwestConfig {
    /// Create a new configuration pointing at the given catalog.
    pub fn new(catalog_url: Url) -> Self {
        Self {
            catalog_url,
            ..Self::default()
        }
    }

    /// Returns the base URL with a trailing slash, ready for joining paths.
    pub fn base_url(&self) -> Url {
        let mut url = self.catalog_url.clone();
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    fn default_user_agent() -> String {
        format!("outlet-assistant/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
