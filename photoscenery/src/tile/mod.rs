//! Tile addressing.
//!
//! Converts between geographic coordinates and packed [`TileId`]s, derives
//! tile bounds, and names the storage directories tiles live in.
//!
//! # Layout
//!
//! ```text
//!   1° cell  ─┬─ 8 rows of 0.125° latitude (y)
//!             └─ per row: columns of tile_width(lat) longitude (x)
//!
//!   10° block dir / 1° tile dir / <id>.<ext>
//!   w050s30      / w045s30     / 2215680.dds
//! ```
//!
//! # Example
//!
//! ```
//! use photoscenery::tile::{tile_width, TileId};
//!
//! let id = TileId::encode(-30.0, -45.0).unwrap();
//! assert_eq!(id.folder_tile(), "w045s30");
//! assert_eq!(tile_width(-30.0), 0.25);
//! ```

mod error;
mod folder;
mod id;
mod width;

pub use error::TileIndexError;
pub use folder::{folder_block, folder_tile, CellName};
pub use id::{
    decode, encode, subtile_ids, DecodedTile, TileBounds, TileId, ROWS_PER_DEGREE,
    ROW_HEIGHT_DEG,
};
pub use width::{columns_per_degree, tile_width};
