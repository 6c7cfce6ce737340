//! Region planning.
//!
//! Turns a [`RegionQuery`] into a [`TilePlan`]: the tiles covering the
//! region, nearest to the focal point first, each annotated with the level of
//! detail it should be fetched at.
//!
//! ```text
//! RegionQuery ─normalize─▶ NormalizedRegion ─RegionPlanner::plan─▶ TilePlan
//!  (polar|box)              (bbox, centre, radius)                  [TileWorkItem]
//! ```

mod config;
mod lod;
mod plan;
mod region;

pub use config::PlannerConfig;
pub use lod::{
    LodPolicy, TileResolution, MAX_REQUESTED_TIER, MAX_TABLE_TIER, ORIGIN_TILE_DISTANCE_NM,
};
pub use plan::{RegionPlanner, TilePlan, TileWorkItem};
pub use region::{nm_per_degree_lat, nm_per_degree_lon, BoundingBox, NormalizedRegion, RegionQuery};

use thiserror::Error;

use crate::coord::CoordError;
use crate::geodesy::GeodesyError;

/// Errors raised while normalising a region.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid region: {0}")]
    Coord(#[from] CoordError),

    #[error("Geodesic computation failed: {0}")]
    Geodesy(#[from] GeodesyError),
}
