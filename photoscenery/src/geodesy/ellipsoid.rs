//! Reference ellipsoid parameters.

use super::GeodesyError;

/// WGS84 semi-major axis in meters.
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 semi-minor axis in meters.
pub const WGS84_B: f64 = 6_356_752.3142;

/// A validated reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    a: f64,
    f: f64,
}

impl Ellipsoid {
    /// The WGS84 ellipsoid, `f = (a - b) / a`.
    pub const WGS84: Ellipsoid = Ellipsoid {
        a: WGS84_A,
        f: (WGS84_A - WGS84_B) / WGS84_A,
    };

    /// Create an ellipsoid from semi-major axis `a` (meters) and flattening `f`.
    ///
    /// # Errors
    ///
    /// `InvalidAxis` if `a <= 0`, `InvalidFlattening` if `|f| >= 1`.
    pub fn new(a: f64, f: f64) -> Result<Self, GeodesyError> {
        let ellipsoid = Self { a, f };
        ellipsoid.validate()?;
        Ok(ellipsoid)
    }

    /// Check the parameters. NaN values are rejected as well.
    pub fn validate(&self) -> Result<(), GeodesyError> {
        if self.a.is_nan() || self.a <= 0.0 {
            return Err(GeodesyError::InvalidAxis(self.a));
        }
        if self.f.is_nan() || self.f.abs() >= 1.0 {
            return Err(GeodesyError::InvalidFlattening(self.f));
        }
        Ok(())
    }

    /// Semi-major axis in meters.
    pub fn semi_major(&self) -> f64 {
        self.a
    }

    /// Semi-minor axis in meters.
    pub fn semi_minor(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// Flattening.
    pub fn flattening(&self) -> f64 {
        self.f
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}
