//! Geographic coordinates and distance approximation.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default search radius for proximity lookups, in kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, `-90..=90`.
    pub lat: f64,
    /// Longitude in degrees, `-180..=180`.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a new point.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` if both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Approximate distance to `other` in kilometres.
    ///
    /// Uses the equirectangular projection, which is accurate to well under
    /// a percent at city scale.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let x = d_lng * ((lat1 + lat2) / 2.0).cos();
        let y = lat2 - lat1;

        EARTH_RADIUS_KM * x.hypot(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANGSAR: GeoPoint = GeoPoint::new(3.128099, 101.678678);
    const ONE_UTAMA: GeoPoint = GeoPoint::new(3.151251, 101.615116);

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(BANGSAR.distance_km(&BANGSAR), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = BANGSAR.distance_km(&ONE_UTAMA);
        let b = ONE_UTAMA.distance_km(&BANGSAR);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_distance_between_outlets() {
        let distance = BANGSAR.distance_km(&ONE_UTAMA);
        assert!((7.4..7.6).contains(&distance), "got {distance}");
    }

    #[test]
    fn test_validity() {
        assert!(BANGSAR.is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }
}
