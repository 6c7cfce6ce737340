//! Stored tile artifacts and their on-disk metadata.

use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::dds::{DdsHeader, DDS_HEADER_LEN};
use crate::tile::{TileBounds, TileId};

use super::StoreError;

/// Container a tile artifact is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactFormat {
    Png,
    Dds,
}

impl ArtifactFormat {
    pub const ALL: [ArtifactFormat; 2] = [ArtifactFormat::Dds, ArtifactFormat::Png];

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Png => "png",
            ArtifactFormat::Dds => "dds",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ArtifactFormat::Png),
            "dds" => Some(ArtifactFormat::Dds),
            _ => None,
        }
    }

    /// Tile id and format encoded in an artifact file name, if it is one.
    pub fn parse_file_name(path: &Path) -> Option<(TileId, ArtifactFormat)> {
        let format = Self::from_extension(path.extension()?.to_str()?)?;
        let id = path.file_stem()?.to_str()?.parse::<TileId>().ok()?;
        Some((id, format))
    }

    /// Pixel dimensions read from the file header only.
    pub fn read_dimensions(&self, path: &Path) -> Result<(u32, u32), StoreError> {
        match self {
            ArtifactFormat::Png => Ok(image::image_dimensions(path)?),
            ArtifactFormat::Dds => {
                let mut header = [0u8; DDS_HEADER_LEN];
                File::open(path)
                    .and_then(|mut f| f.read_exact(&mut header))
                    .map_err(|e| StoreError::io(path, e))?;
                let parsed = DdsHeader::parse(&header)?;
                Ok((parsed.width, parsed.height))
            }
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A tile artifact found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTile {
    pub id: TileId,
    pub path: PathBuf,
    pub format: ArtifactFormat,
    pub pixel_w: u32,
    pub pixel_h: u32,
    pub byte_size: u64,
    pub modified: SystemTime,
}

impl StoredTile {
    /// Read metadata and header of the artifact at `path`.
    pub fn read(id: TileId, format: ArtifactFormat, path: &Path) -> Result<Self, StoreError> {
        let meta = fs::metadata(path).map_err(|e| StoreError::io(path, e))?;
        let (pixel_w, pixel_h) = format.read_dimensions(path)?;
        Ok(Self {
            id,
            path: path.to_path_buf(),
            format,
            pixel_w,
            pixel_h,
            byte_size: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }

    pub fn bounds(&self) -> TileBounds {
        self.id.bounds()
    }
}

impl fmt::Display for StoredTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} {}x{} {} bytes {}",
            self.id,
            self.format,
            self.pixel_w,
            self.pixel_h,
            self.byte_size,
            self.bounds()
        )
    }
}
