//! In-memory catalog with call counters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use outlet_catalog::{CatalogProvider, GeoPoint, InMemoryCatalog, Outlet};

/// Two Kuala Lumpur outlets used across tests and offline runs.
pub fn sample_outlets() -> Vec<Outlet> {
    vec![
        Outlet::new(
            1,
            "Subway Menara UOA Bangsar",
            "Jalan Bangsar Utama 1, Unit 1-2-G, Menara UOA Bangsar, Kuala Lumpur, 59000",
        )
        .with_operating_hours("Monday - Sunday, 8:00 AM - 8:00 PM")
        .with_coordinates(3.128099, 101.678678),
        Outlet::new(
            2,
            "Subway One Utama",
            "318A One Utama, Lower Ground Floor, New Wing, 1 Utama Shopping Centre, Petaling Jaya, 47800",
        )
        .with_operating_hours("0800 - 2200 (Sun - Thur)")
        .with_coordinates(3.151251, 101.615116),
    ]
}

#[derive(Debug, Default)]
struct Counters {
    list_calls: AtomicUsize,
    completed_list_calls: AtomicUsize,
    search_calls: AtomicUsize,
    failing: AtomicBool,
}

/// Catalog that counts fetches and can be made slow or failing.
///
/// Clones share counters.
#[derive(Debug, Clone)]
pub struct CountingCatalog {
    inner: InMemoryCatalog,
    delay: Option<Duration>,
    counters: Arc<Counters>,
}

impl CountingCatalog {
    /// Creates a catalog over `outlets`.
    pub fn new(outlets: Vec<Outlet>) -> Self {
        Self {
            inner: InMemoryCatalog::new(outlets),
            delay: None,
            counters: Arc::default(),
        }
    }

    /// Delays every `list_outlets` call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `list_outlets` calls so far.
    pub fn list_calls(&self) -> usize {
        self.counters.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `list_outlets` calls that ran to completion.
    pub fn completed_list_calls(&self) -> usize {
        self.counters.completed_list_calls.load(Ordering::SeqCst)
    }

    /// Number of `search_outlets` calls so far.
    pub fn search_calls(&self) -> usize {
        self.counters.search_calls.load(Ordering::SeqCst)
    }

    /// Makes every subsequent call fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.counters.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> outlet_catalog::Result<()> {
        if self.counters.failing.load(Ordering::SeqCst) {
            return Err(outlet_catalog::Error::service_unavailable()
                .with_message("catalog service unavailable"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogProvider for CountingCatalog {
    async fn list_outlets(&self) -> outlet_catalog::Result<Vec<Outlet>> {
        self.counters.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.counters
            .completed_list_calls
            .fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.list_outlets().await
    }

    async fn get_outlet(&self, id: i64) -> outlet_catalog::Result<Option<Outlet>> {
        self.check()?;
        self.inner.get_outlet(id).await
    }

    async fn nearby_outlets(
        &self,
        origin: GeoPoint,
        radius_km: f64,
    ) -> outlet_catalog::Result<Vec<Outlet>> {
        self.check()?;
        self.inner.nearby_outlets(origin, radius_km).await
    }

    async fn search_outlets(&self, query: &str) -> outlet_catalog::Result<Vec<Outlet>> {
        self.counters.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.search_outlets(query).await
    }
}
