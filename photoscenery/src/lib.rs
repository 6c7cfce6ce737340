//! Photoscenery - orthophoto scenery tiles for flight simulators
//!
//! Plans the tiles covering a region, downloads each one as a grid of
//! sub-images from a WMS-style map server, assembles and encodes them (DDS
//! or PNG) and stores them under a deterministic on-disk layout:
//!
//! ```text
//! <root>/Orthophotos/<10° block>/<1° cell>/<tile id>.<dds|png>
//! ```
//!
//! Modules, leaves first:
//!
//! - [`geodesy`] - Vincenty distance and bearing on the WGS84 ellipsoid
//! - [`tile`] - tile id codec and folder naming
//! - [`planner`] - region to nearest-first, level-of-detail tile plan
//! - [`store`] - on-disk layout, cache lookups, pruning
//! - [`pipeline`] - per-tile download, mosaic, encode and commit
//! - [`orchestrator`] - region runs with cancellation and reporting

pub mod config;
pub mod coord;
pub mod dds;
pub mod geodesy;
pub mod logging;
pub mod orchestrator;
pub mod pipeline;
pub mod planner;
pub mod provider;
pub mod store;
pub mod tile;

/// Version of the library and CLI, shared across the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
