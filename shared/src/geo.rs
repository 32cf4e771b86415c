use serde::{Deserialize, Serialize};

/// Below this angular distance (degrees of arc) two points are treated as the
/// same location. 1e-6 degrees is roughly 0.11 m on the ground, small enough
/// that only geocoding jitter collapses together.
pub const SAME_POINT_THRESHOLD_DEG: f64 = 1e-6;

/// A geographic point. Field order follows the map widget (`lat`, `lng`);
/// GeoJSON coordinate arrays are `[lng, lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build from a GeoJSON position. Returns `None` unless both components
    /// are present and finite.
    pub fn from_position(coordinates: &[f64]) -> Option<Self> {
        let (&lng, &lat) = (coordinates.first()?, coordinates.get(1)?);
        if !lng.is_finite() || !lat.is_finite() {
            return None;
        }
        Some(Self { lat, lng })
    }

    pub const fn to_position(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Axis-aligned lat/lng rectangle, as reported by the map widget for the
/// visible viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub const fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Inclusive containment test on both axes.
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }
}

/// Great-circle central angle between two points, in degrees (haversine).
pub fn angular_distance_deg(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let central = 2.0 * h.sqrt().min(1.0).asin();
    central.to_degrees()
}

/// True when two points are close enough to be indistinguishable on the map.
pub fn is_same_point(a: LatLng, b: LatLng) -> bool {
    angular_distance_deg(a, b) < SAME_POINT_THRESHOLD_DEG
}

#[cfg(test)]
mod tests {
    use super::{LatLng, LatLngBounds, angular_distance_deg, is_same_point};

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < tolerance,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    #[test]
    fn from_position_reads_lng_then_lat() {
        let point = LatLng::from_position(&[13.4, 52.5]).unwrap();
        assert_eq!(point, LatLng::new(52.5, 13.4));
        assert_eq!(point.to_position(), [13.4, 52.5]);
    }

    #[test]
    fn from_position_rejects_partial_or_non_finite() {
        assert_eq!(LatLng::from_position(&[]), None);
        assert_eq!(LatLng::from_position(&[13.4]), None);
        assert_eq!(LatLng::from_position(&[f64::NAN, 52.5]), None);
        assert_eq!(LatLng::from_position(&[13.4, f64::INFINITY]), None);
    }

    #[test]
    fn bounds_contains_is_inclusive() {
        let bounds = LatLngBounds::new(LatLng::new(-10.0, -20.0), LatLng::new(10.0, 20.0));
        assert!(bounds.contains(LatLng::new(0.0, 0.0)));
        assert!(bounds.contains(LatLng::new(10.0, 20.0)));
        assert!(bounds.contains(LatLng::new(-10.0, -20.0)));
        assert!(!bounds.contains(LatLng::new(10.5, 0.0)));
        assert!(!bounds.contains(LatLng::new(0.0, -20.5)));
    }

    #[test]
    fn distance_along_equator_matches_longitude_delta() {
        let d = angular_distance_deg(LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0));
        assert_close(d, 1.0, 1e-9);
    }

    #[test]
    fn distance_along_meridian_matches_latitude_delta() {
        let d = angular_distance_deg(LatLng::new(10.0, 5.0), LatLng::new(12.5, 5.0));
        assert_close(d, 2.5, 1e-9);
    }

    #[test]
    fn distance_is_zero_for_identical_points() {
        let p = LatLng::new(40.7128, -74.006);
        assert_eq!(angular_distance_deg(p, p), 0.0);
    }

    #[test]
    fn same_point_respects_threshold() {
        let p = LatLng::new(23.8103, 90.4125);
        assert!(is_same_point(p, LatLng::new(23.8103, 90.412_500_3)));
        assert!(!is_same_point(p, LatLng::new(23.8103, 90.412_502)));
        assert!(!is_same_point(p, LatLng::new(23.8113, 90.4125)));
    }
}
