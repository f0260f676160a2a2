//! Cheap-to-clone handle over a [`CatalogProvider`].

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::{CatalogProvider, GeoPoint, Outlet, Result, TRACING_TARGET};

/// Catalog service wrapper.
///
/// Wraps any [`CatalogProvider`] behind an `Arc` and adds call logging.
/// Proximity results are re-checked against the requested radius so that a
/// misbehaving backend can never leak outlets outside of it.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<dyn CatalogProvider>,
}

impl fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogService").finish_non_exhaustive()
    }
}

impl CatalogService {
    /// Create a new catalog service wrapper.
    pub fn new<P>(provider: P) -> Self
    where
        P: CatalogProvider + 'static,
    {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Fetches every outlet in the catalog.
    pub async fn list_outlets(&self) -> Result<Vec<Outlet>> {
        let started_at = Instant::now();
        let result = self.inner.list_outlets().await;

        match &result {
            Ok(outlets) => tracing::debug!(
                target: TRACING_TARGET,
                outlets = outlets.len(),
                elapsed_ms = started_at.elapsed().as_millis(),
                "Fetched outlet catalog"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET,
                error = %error,
                elapsed_ms = started_at.elapsed().as_millis(),
                "Failed to fetch outlet catalog"
            ),
        }

        result
    }

    /// Fetches a single outlet by id.
    pub async fn get_outlet(&self, id: i64) -> Result<Option<Outlet>> {
        let result = self.inner.get_outlet(id).await;

        match &result {
            Ok(outlet) => tracing::debug!(
                target: TRACING_TARGET,
                outlet_id = id,
                found = outlet.is_some(),
                "Looked up outlet"
            ),
            Err(error) => tracing::error!(
                target: TRACING_TARGET,
                outlet_id = id,
                error = %error,
                "Failed to look up outlet"
            ),
        }

        result
    }

    /// Fetches outlets within `radius_km` of `origin`, nearest first.
    ///
    /// Every returned outlet carries a `distance` no greater than `radius_km`.
    pub async fn nearby_outlets(&self, origin: GeoPoint, radius_km: f64) -> Result<Vec<Outlet>> {
        let outlets = self
            .inner
            .nearby_outlets(origin, radius_km)
            .await
            .inspect_err(|error| {
                tracing::error!(
                    target: TRACING_TARGET,
                    lat = origin.lat,
                    lng = origin.lng,
                    radius_km,
                    error = %error,
                    "Failed to fetch nearby outlets"
                );
            })?;

        let received = outlets.len();
        let mut nearby: Vec<Outlet> = outlets
            .into_iter()
            .filter_map(|outlet| {
                let distance = match outlet.distance {
                    Some(distance) => distance,
                    None => origin.distance_km(&outlet.coordinates()?),
                };
                (distance <= radius_km).then(|| outlet.with_distance(distance))
            })
            .collect();
        nearby.sort_by(|a, b| {
            a.distance
                .unwrap_or_default()
                .total_cmp(&b.distance.unwrap_or_default())
        });

        if nearby.len() != received {
            tracing::warn!(
                target: TRACING_TARGET,
                received,
                kept = nearby.len(),
                radius_km,
                "Dropped nearby outlets outside of the requested radius"
            );
        }

        tracing::debug!(
            target: TRACING_TARGET,
            lat = origin.lat,
            lng = origin.lng,
            radius_km,
            outlets = nearby.len(),
            "Fetched nearby outlets"
        );

        Ok(nearby)
    }

    /// Fetches outlets whose name or address contains `query`.
    pub async fn search_outlets(&self, query: &str) -> Result<Vec<Outlet>> {
        let outlets = self.inner.search_outlets(query).await?;

        tracing::debug!(
            target: TRACING_TARGET,
            query,
            outlets = outlets.len(),
            "Searched outlet catalog"
        );

        Ok(outlets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Provider that ignores the radius and returns everything it has.
    struct UnboundedProvider(Vec<Outlet>);

    #[async_trait::async_trait]
    impl CatalogProvider for UnboundedProvider {
        async fn list_outlets(&self) -> Result<Vec<Outlet>> {
            Ok(self.0.clone())
        }

        async fn get_outlet(&self, id: i64) -> Result<Option<Outlet>> {
            Ok(self.0.iter().find(|o| o.id == id).cloned())
        }

        async fn nearby_outlets(&self, _origin: GeoPoint, _radius_km: f64) -> Result<Vec<Outlet>> {
            Ok(self.0.clone())
        }
    }

    fn service() -> CatalogService {
        CatalogService::new(UnboundedProvider(vec![
            Outlet::new(2, "Subway One Utama", "Petaling Jaya")
                .with_coordinates(3.151251, 101.615116),
            Outlet::new(1, "Subway Menara UOA Bangsar", "Bangsar")
                .with_coordinates(3.128099, 101.678678),
            Outlet::new(3, "Subway Nowhere", "No coordinates"),
        ]))
    }

    #[tokio::test]
    async fn test_nearby_enforces_radius() {
        let origin = GeoPoint::new(3.128099, 101.678678);
        let nearby = service().nearby_outlets(origin, 5.0).await.unwrap();

        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].id, 1);
        assert!(nearby.iter().all(|o| o.distance.unwrap() <= 5.0));
    }

    #[tokio::test]
    async fn test_nearby_sorts_by_distance() {
        let origin = GeoPoint::new(3.128099, 101.678678);
        let nearby = service().nearby_outlets(origin, 50.0).await.unwrap();

        let ids: Vec<i64> = nearby.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_nearby_empty_when_nothing_qualifies() {
        let origin = GeoPoint::new(1.3521, 103.8198);
        let nearby = service().nearby_outlets(origin, 1.0).await.unwrap();
        assert!(nearby.is_empty());
    }

    #[tokio::test]
    async fn test_search_outlets() {
        let found = service().search_outlets("bangsar").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);
    }
}
