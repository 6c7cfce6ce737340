//! On-disk tile storage.
//!
//! Artifacts live at `<root>/Orthophotos/<block>/<tile>/<id>.<ext>`. Work in
//! progress is written under `<root>/.tmp/` and renamed into place, so the
//! canonical path only ever holds complete files.

mod artifact;
mod tile_store;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::dds::DdsError;
use crate::tile::TileIndexError;

pub use artifact::{ArtifactFormat, StoredTile};
pub use tile_store::{CellReport, TileStore, ORTHOPHOTOS_DIR, TEMP_DIR};

/// Errors from reading or changing the tile store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output root {path} is not writable: {source}")]
    NotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("bad DDS artifact: {0}")]
    Dds(#[from] DdsError),

    #[error("bad image artifact: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Tile(#[from] TileIndexError),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
