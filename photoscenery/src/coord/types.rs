//! Coordinate type definitions

use std::fmt;

use crate::geodesy::{self, GeodesyError};

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Feet to nautical miles.
pub const NM_PER_FOOT: f64 = 0.000_164_579;

/// A geographic position in degrees.
///
/// Constructed through [`GeoPoint::new`], which rejects out-of-range
/// values instead of clamping them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Create a validated point.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordError> {
        if lat.is_nan() || !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
        if lon.is_nan() || !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(CoordError::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// Latitude in degrees.
    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[inline]
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// WGS84 geodesic distance to `other` in nautical miles.
    pub fn distance_nm(&self, other: &GeoPoint) -> Result<f64, GeodesyError> {
        geodesy::distance_nm(self.lon, self.lat, other.lon, other.lat)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// One reading of the focal point: where it is and how high above it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub point: GeoPoint,
    pub altitude_ft: f64,
}

impl PositionSample {
    pub fn new(point: GeoPoint, altitude_ft: f64) -> Self {
        Self { point, altitude_ft }
    }

    /// A sample on the ground.
    pub fn at(point: GeoPoint) -> Self {
        Self::new(point, 0.0)
    }
}

/// Errors that can occur while building coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude outside [-90, 90]
    InvalidLatitude(f64),
    /// Longitude outside [-180, 180]
    InvalidLongitude(f64),
    /// A bounding box whose lower-left corner is not below/left of its upper-right corner
    InvalidBox { ll: GeoPoint, ur: GeoPoint },
    /// A non-positive or non-finite radius
    InvalidRadius(f64),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(f, "Invalid latitude: {} (must be between -90 and 90)", lat)
            }
            CoordError::InvalidLongitude(lon) => {
                write!(f, "Invalid longitude: {} (must be between -180 and 180)", lon)
            }
            CoordError::InvalidBox { ll, ur } => {
                write!(f, "Invalid bounding box: lower-left {} upper-right {}", ll, ur)
            }
            CoordError::InvalidRadius(r) => {
                write!(f, "Invalid radius: {} nm (must be positive)", r)
            }
        }
    }
}

impl std::error::Error for CoordError {}
