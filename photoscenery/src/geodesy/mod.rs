//! Ellipsoidal geodesy.
//!
//! Iterative Vincenty solutions of the direct (forward) and inverse geodesic
//! problems on a reference ellipsoid, WGS84 by default.
//!
//! All public angles are in degrees; distances are in meters. Internally the
//! solvers work in radians.
//!
//! # Example
//!
//! ```
//! use photoscenery::geodesy::Geodesic;
//!
//! let geodesic = Geodesic::wgs84();
//! let solution = geodesic.inverse(0.0, 0.0, 1.0, 0.0).unwrap();
//! assert!((solution.distance_m - 111_319.49).abs() < 1.0);
//! ```

mod ellipsoid;
mod vincenty;

pub use ellipsoid::Ellipsoid;
pub use vincenty::{ForwardSolution, Geodesic, InverseSolution};

use std::fmt;

/// Meters in one international nautical mile.
pub const METERS_PER_NM: f64 = 1852.0;

/// Convergence threshold for the iterative solvers (relative change).
pub const CONVERGENCE_TOLERANCE: f64 = 1e-9;

/// Upper bound on solver iterations before giving up.
pub const MAX_ITERATIONS: usize = 200;

/// Errors produced by the geodesic solvers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeodesyError {
    /// Latitude outside [-90, 90] degrees
    InvalidLatitude(f64),
    /// Semi-major axis is not strictly positive
    InvalidAxis(f64),
    /// Flattening magnitude is 1 or more
    InvalidFlattening(f64),
    /// The iteration did not settle (nearly antipodal points)
    NoConvergence,
}

impl fmt::Display for GeodesyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeodesyError::InvalidLatitude(lat) => {
                write!(f, "Invalid latitude: {} (must be between -90 and 90)", lat)
            }
            GeodesyError::InvalidAxis(a) => {
                write!(f, "Invalid semi-major axis: {} (must be positive)", a)
            }
            GeodesyError::InvalidFlattening(flat) => {
                write!(f, "Invalid flattening: {} (magnitude must be below 1)", flat)
            }
            GeodesyError::NoConvergence => {
                write!(f, "Geodesic solution did not converge")
            }
        }
    }
}

impl std::error::Error for GeodesyError {}

/// Geodesic distance in nautical miles between two points on WGS84.
///
/// Convenience wrapper over [`Geodesic::inverse`] used by the planner.
pub fn distance_nm(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> Result<f64, GeodesyError> {
    Geodesic::wgs84()
        .inverse(lon0, lat0, lon1, lat1)
        .map(|s| s.distance_m / METERS_PER_NM)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            GeodesyError::InvalidLatitude(91.0).to_string(),
            "Invalid latitude: 91 (must be between -90 and 90)"
        );
        assert_eq!(
            GeodesyError::InvalidAxis(0.0).to_string(),
            "Invalid semi-major axis: 0 (must be positive)"
        );
        assert!(GeodesyError::InvalidFlattening(1.0)
            .to_string()
            .contains("flattening"));
    }

    #[test]
    fn test_distance_nm_one_degree_of_latitude() {
        // One degree of latitude near 45N is close to 60 nm
        let nm = distance_nm(10.0, 45.0, 10.0, 46.0).unwrap();
        assert!((nm - 60.0).abs() < 0.2, "got {}", nm);
    }
}
