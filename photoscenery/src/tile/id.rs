//! Packed tile ids.
//!
//! A tile id packs four integers into a `u32`:
//!
//! ```text
//!  bits 14..   lonBase + 180   (0..=359)
//!  bits 6..14  latBase + 90    (0..=179)
//!  bits 3..6   y, eighth-degree row inside the 1° cell (0..=7)
//!  bits 0..3   x, column inside the longitude bucket
//! ```
//!
//! Only the floored cell of a coordinate matters: every point inside the
//! same tile encodes to the same id.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::folder::{folder_block, folder_tile};
use super::width::{columns_per_degree, tile_width};
use super::TileIndexError;

/// Latitude span of every tile row, in degrees.
pub const ROW_HEIGHT_DEG: f64 = 0.125;

/// Rows per 1° cell.
pub const ROWS_PER_DEGREE: u32 = 8;

/// Geographic extent of a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl TileBounds {
    /// Geometric centre as `(lat, lon)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }

    /// Longitude span in degrees.
    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Latitude span in degrees.
    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Half-open containment: min edges inclusive, max edges exclusive.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat < self.lat_max && lon >= self.lon_min && lon < self.lon_max
    }

    /// Whether `other` lies entirely inside these bounds, edges included.
    pub fn encloses(&self, other: &TileBounds) -> bool {
        const EPS: f64 = 1e-9;
        other.lat_min >= self.lat_min - EPS
            && other.lat_max <= self.lat_max + EPS
            && other.lon_min >= self.lon_min - EPS
            && other.lon_max <= self.lon_max + EPS
    }
}

impl fmt::Display for TileBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lat [{:.3}, {:.3}) lon [{:.3}, {:.3})",
            self.lat_min, self.lat_max, self.lon_min, self.lon_max
        )
    }
}

/// Everything that can be derived from a tile id.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTile {
    pub lon_base: i32,
    pub lat_base: i32,
    pub x: u32,
    pub y: u32,
    /// Longitude span of this tile in degrees
    pub tile_width: f64,
    pub bounds: TileBounds,
    /// 10°-aligned directory name, e.g. `w050s40`
    pub folder_block: String,
    /// 1°-aligned directory name, e.g. `w045s30`
    pub folder_tile: String,
}

/// A validated packed tile id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u32);

/// Tile width for row `y` of the cell at `lat_base`, measured at the row centre.
fn row_width(lat_base: i32, y: u32) -> f64 {
    tile_width(row_center(lat_base, y))
}

fn row_center(lat_base: i32, y: u32) -> f64 {
    lat_base as f64 + (y as f64 + 0.5) * ROW_HEIGHT_DEG
}

/// Western edge of the longitude bucket that starts at or before `lon_base`.
fn bucket_origin(lon_base: i32, width: f64) -> f64 {
    (lon_base as f64 / width).floor() * width
}

impl TileId {
    /// Encode a coordinate into the id of the tile that contains it.
    ///
    /// Longitude 180 is folded onto -180. Latitude 90 has no tile above it
    /// and is rejected.
    ///
    /// # Example
    ///
    /// ```
    /// use photoscenery::tile::TileId;
    ///
    /// let id = TileId::encode(-30.0, -45.0).unwrap();
    /// assert_eq!(id.raw(), 2215680);
    /// ```
    pub fn encode(lat: f64, lon: f64) -> Result<Self, TileIndexError> {
        let unencodable = TileIndexError::Unencodable { lat, lon };
        if !lat.is_finite() || !lon.is_finite() || !(-90.0..90.0).contains(&lat) {
            return Err(unencodable);
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(unencodable);
        }
        let lon = if lon == 180.0 { -180.0 } else { lon };

        let lat_floor = lat.floor();
        let lon_floor = lon.floor();
        let y = (((lat - lat_floor) * ROWS_PER_DEGREE as f64).floor() as u32).min(7);

        let lat_base = lat_floor as i32;
        let lon_base = lon_floor as i32;
        let width = row_width(lat_base, y);
        let origin = bucket_origin(lon_base, width).floor();
        let columns = columns_per_degree(row_center(lat_base, y));
        let x = (((lon - origin) / width).floor() as u32).min(columns - 1);

        Self::from_components(lon_base, lat_base, x, y)
    }

    /// Build an id from its components, checking every range.
    pub fn from_components(
        lon_base: i32,
        lat_base: i32,
        x: u32,
        y: u32,
    ) -> Result<Self, TileIndexError> {
        let valid = (-180..=179).contains(&lon_base)
            && (-90..=89).contains(&lat_base)
            && y < ROWS_PER_DEGREE
            && x < columns_per_degree(row_center(lat_base, y));
        if !valid {
            return Err(TileIndexError::InvalidComponents {
                lon_base,
                lat_base,
                x,
                y,
            });
        }

        let raw = ((lon_base + 180) as u32) << 14
            | ((lat_base + 90) as u32) << 6
            | y << 3
            | x;
        Ok(Self(raw))
    }

    /// Validate a raw packed value.
    pub fn from_raw(raw: u32) -> Result<Self, TileIndexError> {
        let lon = raw >> 14;
        let lat = (raw >> 6) & 0xFF;
        let y = (raw >> 3) & 0x7;
        let x = raw & 0x7;
        if lon > 359 || lat > 179 {
            return Err(TileIndexError::InvalidId(raw));
        }
        Self::from_components(lon as i32 - 180, lat as i32 - 90, x, y)
            .map_err(|_| TileIndexError::InvalidId(raw))
    }

    /// The packed value.
    #[inline]
    pub fn raw(&self) -> u32 {
        self.0
    }

    #[inline]
    pub fn lon_base(&self) -> i32 {
        (self.0 >> 14) as i32 - 180
    }

    #[inline]
    pub fn lat_base(&self) -> i32 {
        ((self.0 >> 6) & 0xFF) as i32 - 90
    }

    #[inline]
    pub fn y(&self) -> u32 {
        (self.0 >> 3) & 0x7
    }

    #[inline]
    pub fn x(&self) -> u32 {
        self.0 & 0x7
    }

    /// Longitude span of this tile in degrees.
    pub fn tile_width(&self) -> f64 {
        row_width(self.lat_base(), self.y())
    }

    /// Geographic extent of this tile.
    pub fn bounds(&self) -> TileBounds {
        let width = self.tile_width();
        let lat_min = self.lat_base() as f64 + self.y() as f64 * ROW_HEIGHT_DEG;
        let lon_min = bucket_origin(self.lon_base(), width) + self.x() as f64 * width;
        TileBounds {
            lat_min,
            lat_max: lat_min + ROW_HEIGHT_DEG,
            lon_min,
            lon_max: lon_min + width,
        }
    }

    /// 10°-aligned directory name.
    pub fn folder_block(&self) -> String {
        folder_block(self.lon_base(), self.lat_base())
    }

    /// 1°-aligned directory name.
    pub fn folder_tile(&self) -> String {
        folder_tile(self.lon_base(), self.lat_base())
    }

    /// `<block>/<tile>` relative directory.
    pub fn folder_path(&self) -> PathBuf {
        PathBuf::from(self.folder_block()).join(self.folder_tile())
    }

    /// All derived values at once.
    pub fn decode(&self) -> DecodedTile {
        DecodedTile {
            lon_base: self.lon_base(),
            lat_base: self.lat_base(),
            x: self.x(),
            y: self.y(),
            tile_width: self.tile_width(),
            bounds: self.bounds(),
            folder_block: self.folder_block(),
            folder_tile: self.folder_tile(),
        }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TileId {
    type Err = TileIndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .trim()
            .parse::<u32>()
            .map_err(|_| TileIndexError::InvalidName(s.to_string()))?;
        Self::from_raw(raw)
    }
}

impl From<TileId> for u32 {
    fn from(id: TileId) -> Self {
        id.0
    }
}

/// Encode a coordinate. Shorthand for [`TileId::encode`].
pub fn encode(lat: f64, lon: f64) -> Result<TileId, TileIndexError> {
    TileId::encode(lat, lon)
}

/// Decode a raw id. Fails for values that no coordinate encodes to.
pub fn decode(raw: u32) -> Result<DecodedTile, TileIndexError> {
    TileId::from_raw(raw).map(|id| id.decode())
}

/// Ids of every tile inside the 1° cell at `(lat_base, lon_base)`, south to
/// north and west to east.
pub fn subtile_ids(lat_base: i32, lon_base: i32) -> Result<Vec<TileId>, TileIndexError> {
    let mut ids = Vec::new();
    for y in 0..ROWS_PER_DEGREE {
        let columns = columns_per_degree(row_center(lat_base, y));
        for x in 0..columns {
            ids.push(TileId::from_components(lon_base, lat_base, x, y)?);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_worked_example() {
        let id = TileId::encode(-30.0, -45.0).unwrap();
        assert_eq!(id.raw(), 2215680);

        let decoded = decode(2215680).unwrap();
        assert_eq!(decoded.lon_base, -45);
        assert_eq!(decoded.lat_base, -30);
        assert_eq!(decoded.x, 0);
        assert_eq!(decoded.y, 0);
        assert_eq!(decoded.tile_width, 0.25);
        assert_eq!(decoded.folder_block, "w050s30");
        assert_eq!(decoded.folder_tile, "w045s30");
    }

    #[test]
    fn test_bounds_of_worked_example() {
        let bounds = TileId::from_raw(2215680).unwrap().bounds();
        assert_eq!(bounds.lat_min, -30.0);
        assert_eq!(bounds.lat_max, -29.875);
        assert_eq!(bounds.lon_min, -45.0);
        assert_eq!(bounds.lon_max, -44.75);
    }

    #[test]
    fn test_equatorial_columns() {
        // 0.125° wide tiles: 8 columns per degree
        let id = TileId::encode(0.3, 10.9).unwrap();
        assert_eq!(id.lon_base(), 10);
        assert_eq!(id.lat_base(), 0);
        assert_eq!(id.y(), 2);
        assert_eq!(id.x(), 7);
        let b = id.bounds();
        assert_eq!(b.lon_min, 10.875);
        assert_eq!(b.lon_max, 11.0);
    }

    #[test]
    fn test_negative_longitude_columns() {
        let id = TileId::encode(45.5, -7.3).unwrap();
        assert_eq!(id.lon_base(), -8);
        // -7.3 lies in [-7.5, -7.25) of the 0.25° grid
        assert_eq!(id.x(), 2);
        let b = id.bounds();
        assert_eq!(b.lon_min, -7.5);
        assert_eq!(b.lon_max, -7.25);
        assert!(b.contains(45.5, -7.3));
    }

    #[test]
    fn test_wide_polar_tiles() {
        // 2° buckets: both halves of the bucket share bounds
        let east = TileId::encode(84.5, 45.5).unwrap();
        let west = TileId::encode(84.5, 44.5).unwrap();
        assert_eq!(east.x(), 0);
        assert_eq!(west.x(), 0);
        assert_eq!(east.bounds(), west.bounds());
        assert_eq!(east.bounds().lon_min, 44.0);
        assert_eq!(east.bounds().width(), 2.0);
    }

    #[test]
    fn test_points_in_same_tile_share_id() {
        let a = TileId::encode(46.01, 7.01).unwrap();
        let b = TileId::encode(46.12, 7.24).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_antimeridian_folds() {
        let id = TileId::encode(10.0, 180.0).unwrap();
        assert_eq!(id.lon_base(), -180);
    }

    #[test]
    fn test_unencodable() {
        assert!(matches!(
            TileId::encode(90.0, 0.0),
            Err(TileIndexError::Unencodable { .. })
        ));
        assert!(matches!(
            TileId::encode(0.0, 181.0),
            Err(TileIndexError::Unencodable { .. })
        ));
        assert!(matches!(
            TileId::encode(f64::NAN, 0.0),
            Err(TileIndexError::Unencodable { .. })
        ));
    }

    #[test]
    fn test_invalid_raw_ids() {
        // lonBase + 180 = 360 is out of range
        assert!(TileId::from_raw(360 << 14).is_err());
        // x = 7 is impossible with 0.25° tiles
        let raw = 135 << 14 | 60 << 6 | 7;
        assert_eq!(TileId::from_raw(raw), Err(TileIndexError::InvalidId(raw)));
    }

    #[test]
    fn test_from_str() {
        let id: TileId = "2215680".parse().unwrap();
        assert_eq!(id.raw(), 2215680);
        assert!("w045s30".parse::<TileId>().is_err());
    }

    #[test]
    fn test_subtile_ids() {
        assert_eq!(subtile_ids(-30, -45).unwrap().len(), 32);
        assert_eq!(subtile_ids(0, 10).unwrap().len(), 64);
        assert_eq!(subtile_ids(80, 10).unwrap().len(), 8);
        let ids = subtile_ids(-30, -45).unwrap();
        assert_eq!(ids[0].raw(), 2215680);
        assert!(ids.iter().all(|id| id.folder_tile() == "w045s30"));
    }

    #[test]
    fn test_folder_path() {
        let id = TileId::from_raw(2215680).unwrap();
        assert_eq!(id.folder_path(), PathBuf::from("w050s30").join("w045s30"));
    }

    proptest! {
        /// Any point inside a tile's bounds encodes back to that tile.
        #[test]
        fn prop_encode_decode_cell(
            lon_base in -180i32..=179,
            lat_base in -90i32..=89,
            y in 0u32..8,
            x_seed in 0u32..8,
            frac_lat in 0.01f64..0.99,
            frac_lon in 0.01f64..0.99,
        ) {
            let columns = columns_per_degree(row_center(lat_base, y));
            let x = x_seed % columns;
            let id = TileId::from_components(lon_base, lat_base, x, y).unwrap();
            prop_assert_eq!(TileId::from_raw(id.raw()).unwrap(), id);

            let b = id.bounds();
            let lat = b.lat_min + frac_lat * b.height();
            let lon = lon_base as f64 + x as f64 * b.width().min(1.0) + frac_lon * b.width().min(1.0);
            let again = TileId::encode(lat, lon).unwrap();
            prop_assert_eq!(again.lat_base(), lat_base);
            prop_assert_eq!(again.lon_base(), lon_base);
            prop_assert_eq!(again.y(), y);
            prop_assert_eq!(again.x(), x);
        }
    }
}
