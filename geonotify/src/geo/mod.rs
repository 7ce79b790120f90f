//! Geodesy helpers for region monitoring and live position filtering.
//!
//! Distances use the haversine formula on a spherical Earth, which is accurate
//! to well under a metre at the scales that matter here (a few hundred metres
//! of jitter, geofence radii of tens to hundreds of metres).
//!
//! # Coordinate System
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east (-180 to 180)
//! - Bearing: degrees true (0-360, 0=north, 90=east)
//! - Distance: metres

use std::f64::consts::PI;

use thiserror::Error;

/// Mean Earth radius in metres (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Minimum valid latitude.
pub const MIN_LAT: f64 = -90.0;
/// Maximum valid latitude.
pub const MAX_LAT: f64 = 90.0;
/// Minimum valid longitude.
pub const MIN_LON: f64 = -180.0;
/// Maximum valid longitude.
pub const MAX_LON: f64 = 180.0;

const DEG_TO_RAD: f64 = PI / 180.0;

/// Errors for invalid geographic input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),
}

/// A point on the Earth's surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another point in metres.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        great_circle_distance_meters(*self, *other)
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// Validate a latitude/longitude pair.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), GeoError> {
    if !(MIN_LAT..=MAX_LAT).contains(&latitude) {
        return Err(GeoError::InvalidLatitude(latitude));
    }
    if !(MIN_LON..=MAX_LON).contains(&longitude) {
        return Err(GeoError::InvalidLongitude(longitude));
    }
    Ok(())
}

/// Great-circle distance between two points in metres (haversine).
///
/// # Example
///
/// ```
/// use geonotify::geo::{great_circle_distance_meters, GeoPoint};
///
/// let a = GeoPoint::new(35.000, 33.000);
/// let b = GeoPoint::new(35.002, 33.000);
/// let d = great_circle_distance_meters(a, b);
/// assert!((d - 222.4).abs() < 1.0);
/// ```
pub fn great_circle_distance_meters(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.latitude * DEG_TO_RAD;
    let lat2_rad = to.latitude * DEG_TO_RAD;
    let delta_lat = (to.latitude - from.latitude) * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` fractionally above 1 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Initial bearing from one point to another in degrees (0-360).
pub fn bearing_degrees(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude * DEG_TO_RAD;
    let lat2 = to.latitude * DEG_TO_RAD;
    let delta_lon = (to.longitude - from.longitude) * DEG_TO_RAD;

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    let bearing = y.atan2(x).to_degrees();
    (bearing + 360.0) % 360.0
}
