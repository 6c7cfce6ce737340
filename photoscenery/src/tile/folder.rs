//! Directory names for tile storage.
//!
//! Names follow `[ew]DDD[ns]DD`: hemisphere letter and zero-padded absolute
//! degrees, longitude first.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::{TileBounds, TileIndexError};

fn hemisphere_name(lon: i32, lat: i32) -> String {
    let ew = if lon < 0 { 'w' } else { 'e' };
    let ns = if lat < 0 { 's' } else { 'n' };
    format!("{}{:03}{}{:02}", ew, lon.unsigned_abs(), ns, lat.unsigned_abs())
}

/// Name of the 1° directory holding tiles of the cell at `(lon, lat)`.
pub fn folder_tile(lon_base: i32, lat_base: i32) -> String {
    hemisphere_name(lon_base, lat_base)
}

/// Name of the 10° directory that groups 1° directories.
///
/// Both axes are floored to the multiple of ten at or below them, so
/// `lon = -45` lands in `w050` and `lat = 45` in `n40`.
pub fn folder_block(lon_base: i32, lat_base: i32) -> String {
    hemisphere_name(lon_base.div_euclid(10) * 10, lat_base.div_euclid(10) * 10)
}

/// A 1° cell, the unit humans use to name scenery tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellName {
    pub lat_base: i32,
    pub lon_base: i32,
}

impl CellName {
    /// Create a cell name, validating ranges.
    pub fn new(lat_base: i32, lon_base: i32) -> Result<Self, TileIndexError> {
        if !(-90..=89).contains(&lat_base) || !(-180..=179).contains(&lon_base) {
            return Err(TileIndexError::InvalidName(format!(
                "{},{}",
                lat_base, lon_base
            )));
        }
        Ok(Self { lat_base, lon_base })
    }

    /// Cell containing a coordinate.
    pub fn containing(lat: f64, lon: f64) -> Result<Self, TileIndexError> {
        Self::new(lat.floor() as i32, lon.floor() as i32)
    }

    /// 1° directory name, e.g. `w045s30`.
    pub fn folder_tile(&self) -> String {
        folder_tile(self.lon_base, self.lat_base)
    }

    /// 10° directory name, e.g. `w050s30`.
    pub fn folder_block(&self) -> String {
        folder_block(self.lon_base, self.lat_base)
    }

    /// `<block>/<tile>` relative directory.
    pub fn folder_path(&self) -> PathBuf {
        PathBuf::from(self.folder_block()).join(self.folder_tile())
    }

    /// The full 1° square.
    pub fn bounds(&self) -> TileBounds {
        TileBounds {
            lat_min: self.lat_base as f64,
            lat_max: self.lat_base as f64 + 1.0,
            lon_min: self.lon_base as f64,
            lon_max: self.lon_base as f64 + 1.0,
        }
    }

    fn parse_hemisphere(name: &str) -> Option<Self> {
        let bytes = name.as_bytes();
        if bytes.len() != 7 || !name.is_ascii() {
            return None;
        }
        let lon_sign = match bytes[0] {
            b'e' | b'E' => 1,
            b'w' | b'W' => -1,
            _ => return None,
        };
        let lat_sign = match bytes[4] {
            b'n' | b'N' => 1,
            b's' | b'S' => -1,
            _ => return None,
        };
        let lon: i32 = name[1..4].parse().ok()?;
        let lat: i32 = name[5..7].parse().ok()?;
        Self::new(lat_sign * lat, lon_sign * lon).ok()
    }

    fn parse_pair(name: &str) -> Option<Self> {
        let (lat, lon) = name.split_once(',')?;
        let lat: i32 = lat.trim().parse().ok()?;
        let lon: i32 = lon.trim().parse().ok()?;
        Self::new(lat, lon).ok()
    }
}

impl FromStr for CellName {
    type Err = TileIndexError;

    /// Accepts `w045s30` style names or a signed `lat,lon` pair such as `-30,-45`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::parse_hemisphere(name)
            .or_else(|| Self::parse_pair(name))
            .ok_or_else(|| TileIndexError::InvalidName(s.to_string()))
    }
}

impl fmt::Display for CellName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.folder_tile())
    }
}
