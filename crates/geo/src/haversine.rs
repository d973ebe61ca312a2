//! Haversine distance calculation.
//!
//! The Haversine formula calculates the great-circle distance between two points
//! on a sphere given their longitudes and latitudes.

use crate::Coordinate;

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculates the great-circle distance between two coordinates in kilometers.
///
/// Returns `f64::INFINITY` when either coordinate has a non-finite component.
///
/// # Example
/// ```
/// use pawfinder_geo::{haversine_distance, Coordinate};
///
/// let here = Coordinate::new(13.7563, 100.5018);
/// assert_eq!(haversine_distance(&here, &here), 0.0);
///
/// let nowhere = Coordinate::new(f64::NAN, 100.5018);
/// assert!(haversine_distance(&here, &nowhere).is_infinite());
/// ```
#[inline]
pub fn haversine_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    haversine_distance_with_radius(from, to, EARTH_RADIUS_KM)
}

/// Calculates the great-circle distance between two coordinates in meters.
#[inline]
pub fn haversine_distance_meters(from: &Coordinate, to: &Coordinate) -> f64 {
    haversine_distance_with_radius(from, to, EARTH_RADIUS_M)
}

/// Distance in kilometers between two optional coordinates.
///
/// A missing side means the distance is unknown and yields `f64::INFINITY`.
#[inline]
pub fn distance_between(from: Option<&Coordinate>, to: Option<&Coordinate>) -> f64 {
    match (from, to) {
        (Some(a), Some(b)) => haversine_distance(a, b),
        _ => f64::INFINITY,
    }
}

#[inline]
fn haversine_distance_with_radius(from: &Coordinate, to: &Coordinate, radius: f64) -> f64 {
    if !from.is_finite() || !to.is_finite() {
        return f64::INFINITY;
    }

    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair outside [0, 1] for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    radius * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BANGKOK: Coordinate = Coordinate { latitude: 13.7563, longitude: 100.5018 };
    const CHIANG_MAI: Coordinate = Coordinate { latitude: 18.7883, longitude: 98.9853 };
    const PHUKET: Coordinate = Coordinate { latitude: 7.8804, longitude: 98.3923 };

    #[test]
    fn test_bangkok_to_chiang_mai() {
        let distance = haversine_distance(&BANGKOK, &CHIANG_MAI);
        // 582.46 km great-circle on a 6371 km sphere
        assert!((distance - 582.5).abs() < 1.0, "Bangkok-Chiang Mai: {}", distance);
    }

    #[test]
    fn test_bangkok_to_phuket() {
        let distance = haversine_distance(&BANGKOK, &PHUKET);
        // Straight line, not road distance: ~693 km
        assert!((distance - 693.0).abs() < 5.0, "Bangkok-Phuket: {}", distance);
    }

    #[test]
    fn test_same_point_zero_distance() {
        assert_eq!(haversine_distance(&BANGKOK, &BANGKOK), 0.0);
    }

    #[test]
    fn test_non_finite_is_unknown() {
        let bad = [
            Coordinate::new(f64::NAN, 100.0),
            Coordinate::new(13.0, f64::INFINITY),
            Coordinate::new(f64::NEG_INFINITY, f64::NAN),
        ];
        for coord in bad {
            assert_eq!(haversine_distance(&BANGKOK, &coord), f64::INFINITY);
            assert_eq!(haversine_distance(&coord, &BANGKOK), f64::INFINITY);
        }
    }

    #[test]
    fn test_missing_side_is_unknown() {
        assert!(distance_between(None, Some(&BANGKOK)).is_infinite());
        assert!(distance_between(Some(&BANGKOK), None).is_infinite());
        assert!(distance_between(Some(&BANGKOK), Some(&CHIANG_MAI)).is_finite());
    }

    #[test]
    fn test_meters_conversion() {
        let km = haversine_distance(&BANGKOK, &CHIANG_MAI);
        let meters = haversine_distance_meters(&BANGKOK, &CHIANG_MAI);
        assert!((meters - km * 1000.0).abs() < 1.0);
    }

    fn coordinate() -> impl Strategy<Value = Coordinate> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lng)| Coordinate::new(lat, lng))
    }

    fn non_finite() -> impl Strategy<Value = f64> {
        prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY)]
    }

    proptest! {
        #[test]
        fn prop_symmetric(a in coordinate(), b in coordinate()) {
            let ab = haversine_distance(&a, &b);
            let ba = haversine_distance(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-9);
            prop_assert!(ab >= 0.0);
        }

        #[test]
        fn prop_self_distance_zero(a in coordinate()) {
            prop_assert_eq!(haversine_distance(&a, &a), 0.0);
        }

        #[test]
        fn prop_non_finite_latitude(a in coordinate(), bad in non_finite(), lng in -180.0f64..=180.0) {
            let b = Coordinate::new(bad, lng);
            prop_assert_eq!(haversine_distance(&a, &b), f64::INFINITY);
        }

        #[test]
        fn prop_non_finite_longitude(a in coordinate(), bad in non_finite(), lat in -90.0f64..=90.0) {
            let b = Coordinate::new(lat, bad);
            prop_assert_eq!(haversine_distance(&b, &a), f64::INFINITY);
        }
    }
}
