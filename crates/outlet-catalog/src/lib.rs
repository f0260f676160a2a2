#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod geo;
mod memory;
mod outlet;
mod service;

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub mod reqwest;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use geo::{DEFAULT_RADIUS_KM, EARTH_RADIUS_KM, GeoPoint};
pub use memory::InMemoryCatalog;
pub use outlet::Outlet;
pub use service::CatalogService;

/// Tracing target for catalog operations.
pub const TRACING_TARGET: &str = "outlet_catalog";

/// Read contract of the outlet catalog.
///
/// Implement this trait to plug in a catalog source.
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetches every outlet in the catalog.
    async fn list_outlets(&self) -> Result<Vec<Outlet>>;

    /// Fetches a single outlet, or `None` if the id is unknown.
    async fn get_outlet(&self, id: i64) -> Result<Option<Outlet>>;

    /// Fetches outlets annotated with their distance from `origin`.
    ///
    /// Results are sorted by ascending distance and should not exceed
    /// `radius_km`. Outlets without coordinates are omitted.
    async fn nearby_outlets(&self, origin: GeoPoint, radius_km: f64) -> Result<Vec<Outlet>>;

    /// Fetches outlets whose name or address contains `query`.
    async fn search_outlets(&self, query: &str) -> Result<Vec<Outlet>> {
        let outlets = self.list_outlets().await?;
        Ok(outlets.into_iter().filter(|o| o.matches(query)).collect())
    }
}
