//! Mosaic composition and output encoding.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{ImageFormat, ImageReader, RgbaImage};
use thiserror::Error;

use crate::dds::{DdsEncoder, DdsError, DdsFormat};
use crate::store::ArtifactFormat;

/// Container a finished tile is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Dds(DdsFormat),
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Dds(DdsFormat::default())
    }
}

impl OutputFormat {
    /// Map the numeric format selector: 0 = PNG, 1 = DDS.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(OutputFormat::Png),
            1 => Some(OutputFormat::default()),
            _ => None,
        }
    }

    pub fn artifact(&self) -> ArtifactFormat {
        match self {
            OutputFormat::Png => ArtifactFormat::Png,
            OutputFormat::Dds(_) => ArtifactFormat::Dds,
        }
    }

    pub fn extension(&self) -> &'static str {
        self.artifact().extension()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Png => write!(f, "png"),
            OutputFormat::Dds(format) => write!(f, "dds ({})", format),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    /// Accepts `png`, `dds`, `0`, `1`, or a DDS compression name (`bc1`, `dxt5`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" | "0" => Ok(OutputFormat::Png),
            "dds" | "1" => Ok(OutputFormat::default()),
            other => other
                .parse::<DdsFormat>()
                .map(OutputFormat::Dds)
                .map_err(|_| format!("unknown output format '{}'", s)),
        }
    }
}

/// Errors from decoding cells, composing or encoding a mosaic.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("expected {expected} cells, got {actual}")]
    CellCount { expected: usize, actual: usize },

    #[error("PNG encoding failed: {0}")]
    Png(#[source] image::ImageError),

    #[error("DDS encoding failed: {0}")]
    Dds(#[from] DdsError),
}

/// Imaging capability used by the fetch pipeline.
///
/// Both operations are CPU-bound and are called from blocking threads.
pub trait ImageCodec: Send + Sync + 'static {
    /// Compose a `grid × grid` mosaic from cell files given in row-major order,
    /// north row first. Each cell occupies `cell_w × cell_h` pixels.
    fn compose(
        &self,
        cells: &[PathBuf],
        grid: u32,
        cell_w: u32,
        cell_h: u32,
    ) -> Result<RgbaImage, CodecError>;

    /// Encode a mosaic into the bytes of the output container.
    fn encode(&self, image: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>, CodecError>;
}

/// [`ImageCodec`] built on the `image` crate and the crate's DDS encoder.
#[derive(Debug, Clone, Default)]
pub struct RasterCodec {
    mipmap_count: Option<usize>,
}

impl RasterCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit DDS mipmap levels; `None` builds the full chain.
    pub fn with_mipmap_count(mut self, count: Option<usize>) -> Self {
        self.mipmap_count = count;
        self
    }
}

/// Decode a cell file, sniffing the format from its content since servers
/// may answer a PNG request with JPEG.
fn load_cell(path: &Path) -> Result<RgbaImage, CodecError> {
    let decode = || -> Result<RgbaImage, image::ImageError> {
        Ok(ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?
            .to_rgba8())
    };
    decode().map_err(|source| CodecError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

impl ImageCodec for RasterCodec {
    fn compose(
        &self,
        cells: &[PathBuf],
        grid: u32,
        cell_w: u32,
        cell_h: u32,
    ) -> Result<RgbaImage, CodecError> {
        let expected = (grid * grid) as usize;
        if cells.len() != expected {
            return Err(CodecError::CellCount {
                expected,
                actual: cells.len(),
            });
        }

        let mut canvas = RgbaImage::new(grid * cell_w, grid * cell_h);
        for (i, path) in cells.iter().enumerate() {
            let mut cell = load_cell(path)?;
            if cell.dimensions() != (cell_w, cell_h) {
                // Servers may round the requested size; fit the cell to its slot
                cell = imageops::resize(&cell, cell_w, cell_h, FilterType::Triangle);
            }
            let (row, col) = (i as u32 / grid, i as u32 % grid);
            imageops::replace(
                &mut canvas,
                &cell,
                (col * cell_w) as i64,
                (row * cell_h) as i64,
            );
        }
        Ok(canvas)
    }

    fn encode(&self, image: &RgbaImage, format: OutputFormat) -> Result<Vec<u8>, CodecError> {
        match format {
            OutputFormat::Png => {
                let mut out = Cursor::new(Vec::new());
                image
                    .write_to(&mut out, ImageFormat::Png)
                    .map_err(CodecError::Png)?;
                Ok(out.into_inner())
            }
            OutputFormat::Dds(dds) => {
                let mut encoder = DdsEncoder::new(dds);
                if let Some(count) = self.mipmap_count {
                    encoder = encoder.with_mipmap_count(count);
                }
                Ok(encoder.encode(image)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dds::DdsHeader;
    use image::Rgba;
    use tempfile::TempDir;

    fn write_cells(dir: &Path, grid: u32, size: u32) -> Vec<PathBuf> {
        (0..grid * grid)
            .map(|i| {
                let path = dir.join(format!("cell_{}.png", i));
                let shade = (i * 40) as u8;
                RgbaImage::from_pixel(size, size, Rgba([shade, 0, 0, 255]))
                    .save(&path)
                    .unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_compose_places_cells_row_major() {
        let dir = TempDir::new().unwrap();
        let cells = write_cells(dir.path(), 2, 8);
        let mosaic = RasterCodec::new().compose(&cells, 2, 8, 8).unwrap();
        assert_eq!(mosaic.dimensions(), (16, 16));
        assert_eq!(mosaic.get_pixel(0, 0)[0], 0);
        assert_eq!(mosaic.get_pixel(15, 0)[0], 40);
        assert_eq!(mosaic.get_pixel(0, 15)[0], 80);
        assert_eq!(mosaic.get_pixel(15, 15)[0], 120);
    }

    #[test]
    fn test_compose_resizes_odd_cells() {
        let dir = TempDir::new().unwrap();
        let cells = write_cells(dir.path(), 1, 10);
        let mosaic = RasterCodec::new().compose(&cells, 1, 8, 4).unwrap();
        assert_eq!(mosaic.dimensions(), (8, 4));
    }

    #[test]
    fn test_compose_rejects_wrong_cell_count() {
        let dir = TempDir::new().unwrap();
        let cells = write_cells(dir.path(), 1, 8);
        assert!(matches!(
            RasterCodec::new().compose(&cells, 2, 8, 8),
            Err(CodecError::CellCount {
                expected: 4,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_compose_rejects_corrupt_cell() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(
            RasterCodec::new().compose(&[path], 1, 8, 8),
            Err(CodecError::Decode { .. })
        ));
    }

    #[test]
    fn test_encode_png_and_dds() {
        let image = RgbaImage::from_pixel(16, 16, Rgba([10, 20, 30, 255]));
        let codec = RasterCodec::new().with_mipmap_count(Some(2));

        let png = codec.encode(&image, OutputFormat::Png).unwrap();
        assert_eq!(&png[1..4], b"PNG");

        let dds = codec
            .encode(&image, OutputFormat::Dds(DdsFormat::BC1))
            .unwrap();
        let header = DdsHeader::parse(&dds).unwrap();
        assert_eq!(header.mipmap_count, 2);
        assert_eq!(header.format, DdsFormat::BC1);
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("0".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!(
            "dds".parse::<OutputFormat>().unwrap(),
            OutputFormat::Dds(DdsFormat::BC3)
        );
        assert_eq!(
            "bc1".parse::<OutputFormat>().unwrap(),
            OutputFormat::Dds(DdsFormat::BC1)
        );
        assert!("tiff".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::from_code(0), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_code(2), None);
        assert_eq!(OutputFormat::Dds(DdsFormat::BC1).extension(), "dds");
    }
}
