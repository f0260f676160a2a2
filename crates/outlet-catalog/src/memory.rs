//! Fixed catalog held in memory.

use std::path::Path;
use std::sync::Arc;

use crate::{CatalogProvider, CatalogService, GeoPoint, Outlet, Result, TRACING_TARGET};

/// A catalog backed by a fixed list of outlets.
///
/// Useful for offline runs (`--catalog-file`) and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    outlets: Arc<[Outlet]>,
}

impl InMemoryCatalog {
    /// Creates a catalog from the given outlets, preserving their order.
    pub fn new(outlets: impl Into<Vec<Outlet>>) -> Self {
        let outlets: Vec<Outlet> = outlets.into();
        Self {
            outlets: outlets.into(),
        }
    }

    /// Loads a catalog from a JSON file containing an array of outlets.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            crate::Error::from(e).with_context(format!("reading {}", path.display()))
        })?;
        let outlets: Vec<Outlet> = serde_json::from_slice(&bytes)?;

        tracing::info!(
            target: TRACING_TARGET,
            path = %path.display(),
            outlets = outlets.len(),
            "Loaded outlet catalog from file"
        );

        Ok(Self::new(outlets))
    }

    /// Number of outlets in the catalog.
    pub fn len(&self) -> usize {
        self.outlets.len()
    }

    /// Returns `true` if the catalog holds no outlets.
    pub fn is_empty(&self) -> bool {
        self.outlets.is_empty()
    }

    /// Converts this catalog into a [`CatalogService`].
    pub fn into_service(self) -> CatalogService {
        CatalogService::new(self)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for InMemoryCatalog {
    async fn list_outlets(&self) -> Result<Vec<Outlet>> {
        Ok(self.outlets.to_vec())
    }

    async fn get_outlet(&self, id: i64) -> Result<Option<Outlet>> {
        Ok(self.outlets.iter().find(|o| o.id == id).cloned())
    }

    async fn nearby_outlets(&self, origin: GeoPoint, radius_km: f64) -> Result<Vec<Outlet>> {
        let mut nearby: Vec<Outlet> = self
            .outlets
            .iter()
            .filter_map(|outlet| {
                let distance = origin.distance_km(&outlet.coordinates()?);
                (distance <= radius_km).then(|| outlet.clone().with_distance(distance))
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.distance
                .unwrap_or_default()
                .total_cmp(&b.distance.unwrap_or_default())
        });

        Ok(nearby)
    }
}
