//! Error types for the fetch pipeline.
//!
//! A [`CellError`] describes why one sub-image could not be obtained; a
//! [`TileFetchError`] is the tile-level outcome the orchestrator records.

use std::path::PathBuf;

use thiserror::Error;

use crate::provider::{ProviderError, TemplateError};
use crate::store::StoreError;

use super::codec::CodecError;

/// A sub-image download that ultimately failed.
#[derive(Debug, Error)]
pub enum CellError {
    #[error("cell ({row}, {col}) failed after {attempts} attempt(s): {source}")]
    Download {
        row: u32,
        col: u32,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    #[error("cell ({row}, {col}) returned no usable image after {attempts} attempt(s): {message}")]
    InvalidImage {
        row: u32,
        col: u32,
        attempts: u32,
        message: String,
    },

    #[error("cell ({row}, {col}) could not be written to {path}: {source}")]
    Io {
        row: u32,
        col: u32,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cell task failed: {0}")]
    TaskFailed(String),

    #[error("cell download cancelled")]
    Cancelled,
}

/// Why a tile was not committed.
#[derive(Debug, Error)]
pub enum TileFetchError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error("mosaic is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}")]
    DimensionMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("blocking task failed: {0}")]
    TaskFailed(String),

    #[error("fetch cancelled")]
    Cancelled,
}

impl TileFetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            TileFetchError::Cancelled | TileFetchError::Cell(CellError::Cancelled)
        )
    }
}
