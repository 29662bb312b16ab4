//! Great-circle geometry for flightabove.
//!
//! All functions operate on WGS84 latitude/longitude in decimal degrees and
//! treat the Earth as a sphere. Inputs are not validated; out-of-range
//! coordinates produce mathematically defined but meaningless results.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate length of one degree of latitude in kilometers.
pub const KM_PER_DEGREE: f64 = 111.32;

/// A point on the Earth's surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in decimal degrees, positive north.
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east.
    pub longitude: f64,
    /// Estimated accuracy radius in meters.
    pub accuracy_meters: f64,
}

impl Coordinate {
    /// Create a coordinate with an unknown (zero) accuracy.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters: 0.0,
        }
    }

    /// Create a coordinate with an accuracy radius.
    #[must_use]
    pub const fn with_accuracy(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
        }
    }

    /// Check that latitude and longitude are finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance between two coordinates in kilometers (Haversine).
#[must_use]
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h marginally past 1.0 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Initial great-circle bearing from `a` towards `b`, in degrees `[0, 360)`.
#[must_use]
pub fn bearing_deg(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    y.atan2(x).to_degrees().rem_euclid(360.0)
}

/// The point reached by travelling `distance_km` from `origin` along the
/// initial bearing `bearing_deg`.
///
/// The result carries the origin's accuracy and has its longitude wrapped
/// into `[-180, 180]`.
#[must_use]
pub fn destination(origin: &Coordinate, bearing_deg: f64, distance_km: f64) -> Coordinate {
    let angular = distance_km / EARTH_RADIUS_KM;
    let bearing = bearing_deg.to_radians();
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * lat2.sin());

    Coordinate {
        latitude: lat2.to_degrees(),
        longitude: wrap_longitude(lon2.to_degrees()),
        accuracy_meters: origin.accuracy_meters,
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

/// A latitude/longitude rectangle used to query providers for an area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Northern latitude edge.
    pub north: f64,
    /// Southern latitude edge.
    pub south: f64,
    /// Western longitude edge.
    pub west: f64,
    /// Eastern longitude edge.
    pub east: f64,
}

impl BoundingBox {
    /// Build a box enclosing a circle of `radius_km` around `center`.
    ///
    /// The longitude span widens with latitude to account for meridian
    /// convergence. Edges are clamped to valid coordinate ranges.
    #[must_use]
    pub fn around(center: &Coordinate, radius_km: f64) -> Self {
        let radius_km = radius_km.max(0.0);
        let lat_delta = radius_km / KM_PER_DEGREE;

        // Keep cos() away from zero near the poles.
        let cos_lat = center.latitude.to_radians().cos().abs().max(0.01);
        let lon_delta = (radius_km / (KM_PER_DEGREE * cos_lat)).min(180.0);

        Self {
            north: (center.latitude + lat_delta).min(90.0),
            south: (center.latitude - lat_delta).max(-90.0),
            west: (center.longitude - lon_delta).max(-180.0),
            east: (center.longitude + lon_delta).min(180.0),
        }
    }

    /// Check whether a coordinate falls inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.south..=self.north).contains(&point.latitude)
            && (self.west..=self.east).contains(&point.longitude)
    }

    /// Format as the `north,south,west,east` query value used by providers.
    #[must_use]
    pub fn to_query_value(&self) -> String {
        format!(
            "{:.3},{:.3},{:.3},{:.3}",
            self.north, self.south, self.west, self.east
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAN_FRANCISCO: Coordinate = Coordinate::new(37.7749, -122.4194);
    const LOS_ANGELES: Coordinate = Coordinate::new(34.0522, -118.2437);

    #[test]
    fn test_distance_to_self_is_zero() {
        for point in [
            SAN_FRANCISCO,
            LOS_ANGELES,
            Coordinate::new(0.0, 0.0),
            Coordinate::new(89.9, 179.9),
            Coordinate::new(-45.0, -170.0),
        ] {
            assert_eq!(distance_km(&point, &point), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let ab = distance_km(&SAN_FRANCISCO, &LOS_ANGELES);
        let ba = distance_km(&LOS_ANGELES, &SAN_FRANCISCO);
        assert!((ab - ba).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_latitude_at_equator() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        let d = distance_km(&a, &b);
        assert!((d - 111.0).abs() / 111.0 < 0.01, "got {d}");
    }

    #[test]
    fn test_known_city_distance() {
        // SF to LA is roughly 559 km.
        let d = distance_km(&SAN_FRANCISCO, &LOS_ANGELES);
        assert!((550.0..570.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_distance_monotonic_for_small_offsets() {
        let origin = Coordinate::new(51.5, -0.12);
        let mut previous = 0.0;
        for step in 1..=10 {
            let p = Coordinate::new(51.5 + f64::from(step) * 0.01, -0.12);
            let d = distance_km(&origin, &p);
            assert!(d > previous);
            previous = d;
        }
    }

    #[test]
    fn test_antipodal_distance_is_half_circumference() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let d = distance_km(&a, &b);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!((bearing_deg(&origin, &Coordinate::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((bearing_deg(&origin, &Coordinate::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing_deg(&origin, &Coordinate::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing_deg(&origin, &Coordinate::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_destination_round_trips_distance() {
        for bearing in [0.0, 45.0, 135.0, 200.0, 315.0] {
            let target = destination(&SAN_FRANCISCO, bearing, 42.0);
            let d = distance_km(&SAN_FRANCISCO, &target);
            assert!((d - 42.0).abs() < 1e-6, "bearing {bearing}: {d}");
        }
    }

    #[test]
    fn test_destination_zero_distance() {
        let target = destination(&SAN_FRANCISCO, 123.0, 0.0);
        assert!(distance_km(&SAN_FRANCISCO, &target) < 1e-9);
    }

    #[test]
    fn test_destination_wraps_longitude() {
        let origin = Coordinate::new(0.0, 179.9);
        let target = destination(&origin, 90.0, 50.0);
        assert!(target.is_valid());
        assert!(target.longitude < 0.0);
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(SAN_FRANCISCO.is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_bounding_box_contains_center_and_radius() {
        let bbox = BoundingBox::around(&SAN_FRANCISCO, 50.0);
        assert!(bbox.contains(&SAN_FRANCISCO));
        for bearing in [0.0, 90.0, 180.0, 270.0] {
            let edge = destination(&SAN_FRANCISCO, bearing, 49.0);
            assert!(bbox.contains(&edge), "bearing {bearing}");
        }
    }

    #[test]
    fn test_bounding_box_widens_with_latitude() {
        let equator = BoundingBox::around(&Coordinate::new(0.0, 0.0), 100.0);
        let north = BoundingBox::around(&Coordinate::new(60.0, 0.0), 100.0);
        let equator_span = equator.east - equator.west;
        let north_span = north.east - north.west;
        assert!(north_span > equator_span * 1.9);
    }

    #[test]
    fn test_bounding_box_clamped_at_pole() {
        let bbox = BoundingBox::around(&Coordinate::new(89.9, 0.0), 100.0);
        assert!(bbox.north <= 90.0);
        assert!(bbox.west >= -180.0);
        assert!(bbox.east <= 180.0);
    }

    #[test]
    fn test_bounding_box_query_value() {
        let bbox = BoundingBox {
            north: 38.2,
            south: 37.3,
            west: -123.0,
            east: -121.8,
        };
        assert_eq!(bbox.to_query_value(), "38.200,37.300,-123.000,-121.800");
    }
}
