//! Geographic coordinates.
//!
//! [`GeoPoint`] is the validated latitude/longitude pair every other module
//! consumes; altitude travels separately as feet and is converted with
//! [`feet_to_nm`] where the planner needs it.

mod types;

pub use types::{
    CoordError, GeoPoint, PositionSample, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON, NM_PER_FOOT,
};

/// Convert an altitude in feet to nautical miles.
#[inline]
pub fn feet_to_nm(feet: f64) -> f64 {
    feet * NM_PER_FOOT
}

/// Round `value` to `decimals` decimal places.
#[inline]
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        let p = GeoPoint::new(-30.0, -45.0).unwrap();
        assert_eq!(p.lat(), -30.0);
        assert_eq!(p.lon(), -45.0);
    }

    #[test]
    fn test_poles_and_antimeridian_are_valid() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        assert!(matches!(
            GeoPoint::new(90.5, 0.0),
            Err(CoordError::InvalidLatitude(_))
        ));
        assert!(matches!(
            GeoPoint::new(f64::NAN, 0.0),
            Err(CoordError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_invalid_longitude() {
        assert!(matches!(
            GeoPoint::new(0.0, -180.01),
            Err(CoordError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_error_display() {
        let err = CoordError::InvalidLatitude(95.0);
        assert_eq!(
            err.to_string(),
            "Invalid latitude: 95 (must be between -90 and 90)"
        );
        let err = CoordError::InvalidRadius(-1.0);
        assert_eq!(err.to_string(), "Invalid radius: -1 nm (must be positive)");
    }

    #[test]
    fn test_distance_nm() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0, 1.0).unwrap();
        let nm = a.distance_nm(&b).unwrap();
        assert!((nm - 60.108).abs() < 0.01, "got {}", nm);
    }

    #[test]
    fn test_feet_to_nm() {
        assert!((feet_to_nm(6076.12) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.2345, 2), 1.23);
        assert_eq!(round_to(-45.06, 1), -45.1);
    }
}
