//! Reqwest-based HTTP client for the outlet catalog service.

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::{Error, ReqwestConfig, TRACING_TARGET};
use crate::{CatalogProvider, CatalogService, GeoPoint, Outlet};

/// Inner client that holds the HTTP client and configuration.
struct ReqwestClientInner {
    http: Client,
    base_url: Url,
    config: ReqwestConfig,
}

/// Reqwest-based client for the remote outlet catalog.
///
/// Talks to a service exposing `GET /outlets/`, `GET /outlets/{id}`,
/// `GET /outlets/nearby/?lat&long&radius` and `GET /outlets/search/?query`
/// under the configured base URL.
///
/// # Examples
///
/// ```rust,ignore
/// use outlet_catalog::reqwest::{ReqwestClient, ReqwestConfig};
///
/// let client = ReqwestClient::new(ReqwestConfig::default())?;
/// let outlets = client.into_service().list_outlets().await?;
/// ```
#[derive(Clone)]
pub struct ReqwestClient {
    inner: Arc<ReqwestClientInner>,
}

impl std::fmt::Debug for ReqwestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestClient {
    /// Creates a new reqwest client with the given configuration.
    pub fn new(config: ReqwestConfig) -> crate::Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();
        let base_url = config.base_url();

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %base_url,
            timeout_ms = timeout.as_millis(),
            "Creating reqwest client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(|e| {
                crate::Error::configuration()
                    .with_message("Failed to create HTTP client")
                    .with_source(e)
            })?;

        let inner = ReqwestClientInner {
            http,
            base_url,
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Converts this client into a [`CatalogService`] for use with dependency injection.
    pub fn into_service(self) -> CatalogService {
        CatalogService::new(self)
    }

    /// Resolves a path relative to the catalog base URL.
    pub(crate) fn endpoint(&self, path: &str) -> crate::Result<Url> {
        Ok(self.inner.base_url.join(path).map_err(Error::from)?)
    }

    async fn get(&self, url: Url) -> crate::Result<Response> {
        tracing::trace!(target: TRACING_TARGET, url = %url, "Sending catalog request");

        let response = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .map_err(Error::from)?;

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> crate::Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        Ok(response.json::<T>().await.map_err(Error::from)?)
    }
}

/// Maps an unsuccessful catalog status code to an error.
fn status_error(status: StatusCode) -> crate::Error {
    let error = match status {
        StatusCode::NOT_FOUND => crate::Error::not_found(),
        StatusCode::TOO_MANY_REQUESTS => crate::Error::rate_limited(),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => crate::Error::invalid_input(),
        s if s.is_server_error() => crate::Error::service_unavailable(),
        _ => crate::Error::external_error(),
    };

    error.with_message(format!("Catalog service returned {status}"))
}

#[async_trait::async_trait]
impl CatalogProvider for ReqwestClient {
    async fn list_outlets(&self) -> crate::Result<Vec<Outlet>> {
        let response = self.get(self.endpoint("outlets/")?).await?;
        Self::decode(response).await
    }

    async fn get_outlet(&self, id: i64) -> crate::Result<Option<Outlet>> {
        let response = self.get(self.endpoint(&format!("outlets/{id}"))?).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Self::decode(response).await.map(Some)
    }

    async fn nearby_outlets(
        &self,
        origin: GeoPoint,
        radius_km: f64,
    ) -> crate::Result<Vec<Outlet>> {
        let mut url = self.endpoint("outlets/nearby/")?;
        url.query_pairs_mut()
            .append_pair("lat", &origin.lat.to_string())
            .append_pair("long", &origin.lng.to_string())
            .append_pair("radius", &radius_km.to_string());

        let response = self.get(url).await?;
        Self::decode(response).await
    }

    async fn search_outlets(&self, query: &str) -> crate::Result<Vec<Outlet>> {
        let mut url = self.endpoint("outlets/search/")?;
        url.query_pairs_mut().append_pair("query", query);

        let response = self.get(url).await?;
        Self::decode(response).await
    }
}
