//! Error types for tile addressing.

use std::fmt;

/// Errors raised while encoding, decoding or naming tiles.
#[derive(Debug, Clone, PartialEq)]
pub enum TileIndexError {
    /// A coordinate that has no tile (out of range, NaN, or the north pole itself)
    Unencodable {
        /// Latitude value
        lat: f64,
        /// Longitude value
        lon: f64,
    },
    /// A packed id whose components are out of range
    InvalidId(u32),
    /// Components that do not describe a tile
    InvalidComponents {
        lon_base: i32,
        lat_base: i32,
        x: u32,
        y: u32,
    },
    /// A tile name that cannot be parsed
    InvalidName(String),
}

impl fmt::Display for TileIndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileIndexError::Unencodable { lat, lon } => {
                write!(f, "Coordinate (lat={}, lon={}) has no tile", lat, lon)
            }
            TileIndexError::InvalidId(id) => write!(f, "Invalid tile id: {}", id),
            TileIndexError::InvalidComponents {
                lon_base,
                lat_base,
                x,
                y,
            } => write!(
                f,
                "Invalid tile components: lon={}, lat={}, x={}, y={}",
                lon_base, lat_base, x, y
            ),
            TileIndexError::InvalidName(name) => write!(f, "Invalid tile name: '{}'", name),
        }
    }
}

impl std::error::Error for TileIndexError {}
