//! Outlet records as served by the catalog.

use serde::{Deserialize, Serialize};

use crate::GeoPoint;

/// A single retail outlet.
///
/// Records are immutable once fetched. The remote catalog names the
/// longitude column `long`; both `long` and `lng` are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlet {
    /// Unique outlet identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Free-text opening hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<String>,
    /// Latitude in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Longitude in degrees.
    #[serde(default, alias = "long", skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    /// Waze navigation link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waze_link: Option<String>,
    /// Google Maps link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_maps_link: Option<String>,
    /// Distance in kilometres from a query point.
    ///
    /// Only present on proximity results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Outlet {
    /// Creates an outlet with only the required fields set.
    pub fn new(id: i64, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            operating_hours: None,
            lat: None,
            lng: None,
            waze_link: None,
            google_maps_link: None,
            distance: None,
        }
    }

    /// Sets the opening hours.
    #[must_use]
    pub fn with_operating_hours(mut self, hours: impl Into<String>) -> Self {
        self.operating_hours = Some(hours.into());
        self
    }

    /// Sets the coordinates.
    #[must_use]
    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }

    /// Annotates the record with a distance from a query point.
    #[must_use]
    pub fn with_distance(mut self, distance_km: f64) -> Self {
        self.distance = Some(distance_km);
        self
    }

    /// Returns the outlet location, if both coordinates are known.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }

    /// Case-insensitive substring match on name or address.
    ///
    /// A blank query matches every outlet.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&query) || self.address.to_lowercase().contains(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bangsar() -> Outlet {
        Outlet::new(
            1,
            "Subway Menara UOA Bangsar",
            "Jalan Bangsar Utama 1, Unit 1-2-G, Menara UOA Bangsar, Kuala Lumpur, 59000",
        )
        .with_operating_hours("Monday - Sunday, 8:00 AM - 8:00 PM")
        .with_coordinates(3.128099, 101.678678)
    }

    #[test]
    fn test_matches_name_and_address() {
        let outlet = bangsar();
        assert!(outlet.matches("menara uoa"));
        assert!(outlet.matches("KUALA LUMPUR"));
        assert!(outlet.matches("  "));
        assert!(!outlet.matches("pavilion"));
    }

    #[test]
    fn test_deserialize_remote_record() {
        let json = serde_json::json!({
            "id": 7,
            "name": "Subway Pavilion",
            "address": "Jalan Bukit Bintang",
            "operating_hours": null,
            "lat": 3.149,
            "long": 101.713,
            "waze_link": "https://waze.com/ul?q=pavilion",
            "created_at": "2024-01-01T00:00:00",
            "updated_at": "2024-01-01T00:00:00"
        });

        let outlet: Outlet = serde_json::from_value(json).unwrap();
        assert_eq!(outlet.id, 7);
        assert_eq!(outlet.lng, Some(101.713));
        assert!(outlet.operating_hours.is_none());
        assert!(outlet.distance.is_none());
    }

    #[test]
    fn test_coordinates_require_both_components() {
        let mut outlet = bangsar();
        assert!(outlet.coordinates().is_some());

        outlet.lng = None;
        assert!(outlet.coordinates().is_none());
    }

    #[test]
    fn test_serialize_skips_missing_fields() {
        let value = serde_json::to_value(Outlet::new(2, "A", "B")).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert!(!object.contains_key("distance"));
    }
}
