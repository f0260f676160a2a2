//! Outlet catalog source configuration.

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Args;
use outlet_catalog::reqwest::{ReqwestClient, ReqwestConfig};
use outlet_catalog::{CatalogService, InMemoryCatalog};
use serde::{Deserialize, Serialize};

use super::TRACING_TARGET_CONFIG;

/// Where outlet records come from.
///
/// The remote catalog service is used unless `--catalog-file` points at a
/// JSON array of outlets.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Remote catalog service client.
    #[clap(flatten)]
    pub remote: ReqwestConfig,

    /// JSON file with an array of outlets, used instead of the remote catalog.
    #[arg(long = "catalog-file", env = "CATALOG_FILE")]
    #[serde(default)]
    pub catalog_file: Option<PathBuf>,
}

impl CatalogConfig {
    /// Validates the catalog source.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(path) = &self.catalog_file
            && !path.is_file()
        {
            return Err(anyhow!("catalog file {} does not exist", path.display()));
        }

        if self.remote.http_timeout == 0 {
            return Err(anyhow!("HTTP timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Creates the catalog service for the configured source.
    pub fn create_service(&self) -> anyhow::Result<CatalogService> {
        match &self.catalog_file {
            Some(path) => {
                let catalog = InMemoryCatalog::from_json_file(path)
                    .with_context(|| format!("failed to load catalog file {}", path.display()))?;
                Ok(catalog.into_service())
            }
            None => {
                let client = ReqwestClient::new(self.remote.clone())
                    .context("failed to create catalog client")?;
                Ok(client.into_service())
            }
        }
    }

    /// Logs catalog configuration.
    pub fn log(&self) {
        match &self.catalog_file {
            Some(path) => tracing::info!(
                target: TRACING_TARGET_CONFIG,
                path = %path.display(),
                "Catalog configuration (file)"
            ),
            None => tracing::info!(
                target: TRACING_TARGET_CONFIG,
                url = %self.remote.catalog_url,
                timeout_secs = self.remote.http_timeout,
                "Catalog configuration (remote)"
            ),
        }
    }
}
