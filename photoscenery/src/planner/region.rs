//! Region queries and their normalisation to a bounding box.

use std::f64::consts::PI;

use crate::coord::{round_to, CoordError, GeoPoint, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use crate::tile::{tile_width, ROW_HEIGHT_DEG};

use super::PlanError;

/// Kilometers to nautical miles, as used for the degree-length approximations.
const NM_PER_KM: f64 = 0.53996;

/// Nautical miles per degree of longitude at `lat` (spherical, R = 6371 km).
pub fn nm_per_degree_lon(lat: f64) -> f64 {
    2.0 * PI * 6371.0 * NM_PER_KM * lat.to_radians().cos() / 360.0
}

/// Nautical miles per degree of latitude (spherical, R = 6378 km).
pub fn nm_per_degree_lat() -> f64 {
    PI * 6378.0 * NM_PER_KM / 180.0
}

/// Region to cover with tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionQuery {
    /// A circle around a centre point
    Polar { center: GeoPoint, radius_nm: f64 },
    /// A box from lower-left to upper-right corner
    Box { ll: GeoPoint, ur: GeoPoint },
}

/// Axis-aligned box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_ll: f64,
    pub lon_ll: f64,
    pub lat_ur: f64,
    pub lon_ur: f64,
}

impl BoundingBox {
    pub fn lat_span(&self) -> f64 {
        self.lat_ur - self.lat_ll
    }

    pub fn lon_span(&self) -> f64 {
        self.lon_ur - self.lon_ll
    }

    /// Clamp to the valid coordinate range.
    fn clamped(self) -> Self {
        Self {
            lat_ll: self.lat_ll.clamp(MIN_LAT, MAX_LAT),
            lon_ll: self.lon_ll.clamp(MIN_LON, MAX_LON),
            lat_ur: self.lat_ur.clamp(MIN_LAT, MAX_LAT),
            lon_ur: self.lon_ur.clamp(MIN_LON, MAX_LON),
        }
    }
}

/// A query reduced to the values the planner works with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedRegion {
    pub bbox: BoundingBox,
    /// Centre used as focal point when no live position is available
    pub center: GeoPoint,
    /// Radius in nm; the denominator of the relative-distance LOD rule
    pub radius_nm: f64,
}

impl RegionQuery {
    /// Circle of `radius_nm` around `center`.
    pub fn polar(center: GeoPoint, radius_nm: f64) -> Result<Self, CoordError> {
        if !radius_nm.is_finite() || radius_nm <= 0.0 {
            return Err(CoordError::InvalidRadius(radius_nm));
        }
        Ok(RegionQuery::Polar { center, radius_nm })
    }

    /// Box from `ll` to `ur`; `ll` must be strictly south-west of `ur`.
    pub fn bounding_box(ll: GeoPoint, ur: GeoPoint) -> Result<Self, CoordError> {
        if ll.lat() >= ur.lat() || ll.lon() >= ur.lon() {
            return Err(CoordError::InvalidBox { ll, ur });
        }
        Ok(RegionQuery::Box { ll, ur })
    }

    /// Reduce to a bounding box, focal centre and radius.
    ///
    /// Polar queries snap the centre to its tile origin and extend by the
    /// radius converted to degrees, rounded to 0.1°. Box queries use the
    /// box centroid and the geodesic length of the diagonal.
    pub fn normalize(&self) -> Result<NormalizedRegion, PlanError> {
        match *self {
            RegionQuery::Polar { center, radius_nm } => {
                let (lat, lon) = (center.lat(), center.lon());
                let width = tile_width(lat);
                let lat_origin = (lat / ROW_HEIGHT_DEG).floor() * ROW_HEIGHT_DEG;
                let lon_origin = (lon / width).floor() * width;
                let dlat = radius_nm / nm_per_degree_lat();
                let dlon = radius_nm / nm_per_degree_lon(lat);

                let bbox = BoundingBox {
                    lat_ll: round_to(lat_origin - dlat, 1),
                    lon_ll: round_to(lon_origin - dlon, 1),
                    lat_ur: round_to(lat_origin + ROW_HEIGHT_DEG + dlat, 1),
                    lon_ur: round_to(lon_origin + width + dlon, 1),
                }
                .clamped();

                Ok(NormalizedRegion {
                    bbox,
                    center,
                    radius_nm,
                })
            }
            RegionQuery::Box { ll, ur } => {
                let center = GeoPoint::new(
                    ll.lat() + (ur.lat() - ll.lat()) / 2.0,
                    ll.lon() + (ur.lon() - ll.lon()) / 2.0,
                )?;
                let radius_nm = round_to(ll.distance_nm(&ur)?, 2);
                Ok(NormalizedRegion {
                    bbox: BoundingBox {
                        lat_ll: ll.lat(),
                        lon_ll: ll.lon(),
                        lat_ur: ur.lat(),
                        lon_ur: ur.lon(),
                    },
                    center,
                    radius_nm,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_degree_lengths() {
        assert!((nm_per_degree_lat() - 60.11).abs() < 0.01);
        assert!((nm_per_degree_lon(0.0) - 60.04).abs() < 0.01);
        assert!((nm_per_degree_lon(60.0) - 30.02).abs() < 0.01);
    }

    #[test]
    fn test_polar_snaps_and_extends() {
        let region = RegionQuery::polar(point(45.55, 7.3), 6.0)
            .unwrap()
            .normalize()
            .unwrap();
        // Centre snaps to (45.5, 7.25); 6 nm is ~0.1° of latitude
        assert_eq!(region.bbox.lat_ll, 45.4);
        assert_eq!(region.bbox.lat_ur, 45.7);
        assert_eq!(region.bbox.lon_ll, 7.1);
        assert_eq!(region.bbox.lon_ur, 7.6);
        assert_eq!(region.radius_nm, 6.0);
        assert_eq!(region.center, point(45.55, 7.3));
    }

    #[test]
    fn test_polar_near_pole_is_clamped() {
        let region = RegionQuery::polar(point(89.9, 0.0), 30.0)
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(region.bbox.lat_ur, 90.0);
        assert_eq!(region.bbox.lon_ll, -180.0);
        assert_eq!(region.bbox.lon_ur, 180.0);
    }

    #[test]
    fn test_box_centroid_and_diagonal() {
        let region = RegionQuery::bounding_box(point(0.0, 0.0), point(1.0, 1.0))
            .unwrap()
            .normalize()
            .unwrap();
        assert_eq!(region.center, point(0.5, 0.5));
        // Diagonal of a 1° box at the equator is about 85 nm
        assert!((region.radius_nm - 84.9).abs() < 0.5, "got {}", region.radius_nm);
        assert_eq!(region.bbox.lat_span(), 1.0);
    }

    #[test]
    fn test_rejects_bad_queries() {
        assert_eq!(
            RegionQuery::polar(point(0.0, 0.0), 0.0),
            Err(CoordError::InvalidRadius(0.0))
        );
        assert!(RegionQuery::polar(point(0.0, 0.0), f64::NAN).is_err());
        assert!(matches!(
            RegionQuery::bounding_box(point(1.0, 0.0), point(0.0, 1.0)),
            Err(CoordError::InvalidBox { .. })
        ));
    }
}
