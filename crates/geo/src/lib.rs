//! Geospatial helpers for PawFinder.
//!
//! This crate provides:
//! - Haversine distance between report pins and a reference coordinate
//! - Batch distance computation with optional parallelism
//! - Human-readable distance labels
//!
//! Distances involving a missing or non-finite coordinate are reported as
//! `f64::INFINITY`, never as zero or NaN, so "unknown" always ranks last.
//!
//! # Example
//!
//! ```
//! use pawfinder_geo::{haversine_distance, Coordinate};
//!
//! let bangkok = Coordinate::new(13.7563, 100.5018);
//! let chiang_mai = Coordinate::new(18.7883, 98.9853);
//!
//! let distance_km = haversine_distance(&bangkok, &chiang_mai);
//! assert!((distance_km - 582.5).abs() < 1.0);
//! ```

mod error;
mod format;
mod haversine;
pub mod batch;

pub use batch::distances_from;
pub use error::{GeoError, Result};
pub use format::format_distance;
pub use haversine::{
    distance_between, haversine_distance, haversine_distance_meters, EARTH_RADIUS_KM,
    EARTH_RADIUS_M,
};

/// A geographic coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate. No range checking is done here; see
    /// [`Coordinate::is_valid`] and [`Coordinate::try_new`].
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        let coord = Self::new(latitude, longitude);
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(GeoError::InvalidCoordinate(format!("({latitude}, {longitude})")))
        }
    }

    /// Both components are finite numbers.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Returns true if the coordinate is finite and within range.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_try_new() {
        assert!(Coordinate::try_new(13.7563, 100.5018).is_ok());
        let err = Coordinate::try_new(f64::NAN, 100.5).unwrap_err();
        assert!(err.to_string().contains("Invalid coordinate"));
    }

    #[test]
    fn test_coordinate_from_tuple() {
        let coord: Coordinate = (13.7563, 100.5018).into();
        assert_eq!(coord.latitude, 13.7563);
        assert_eq!(coord.to_string(), "13.75630, 100.50180");
    }
}
