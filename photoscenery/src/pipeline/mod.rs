//! Tile fetch pipeline.
//!
//! Turns one [`TileWorkItem`](crate::planner::TileWorkItem) into a committed
//! artifact in the [`TileStore`](crate::store::TileStore).
//!
//! # Stages
//!
//! ```text
//! cache check ─► sub-grid URLs ─► concurrent downloads ─► compose ─► encode ─► commit
//!      │                          (retry, validate)       (blocking)  (blocking)  (rename)
//!      └─ hit: Cached, no network
//! ```
//!
//! Any failing cell fails the whole tile. Scratch files live in a per-tile
//! directory under the store's temp dir and are removed when the fetch ends.

mod codec;
mod config;
mod download;
mod error;
mod fetch;
mod grid;

pub use codec::{CodecError, ImageCodec, OutputFormat, RasterCodec};
pub use config::{
    PipelineConfig, DEFAULT_BACKOFF_STEP, DEFAULT_CELL_CONCURRENCY, DEFAULT_MAX_ATTEMPTS,
};
pub use error::{CellError, TileFetchError};
pub use fetch::{FetchOutcome, FetchPipeline, FetchStage};
pub use grid::{plan_cells, GridCell};
