//! Image to DDS byte stream.

use crate::dds::block::{encode_bc1, encode_bc3, Block};
use crate::dds::mipmap::build_chain;
use crate::dds::types::{DdsError, DdsFormat, DdsHeader, DDS_HEADER_LEN};
use image::RgbaImage;
use rayon::prelude::*;

/// Encodes RGBA images into block-compressed DDS files.
#[derive(Debug, Clone, Copy)]
pub struct DdsEncoder {
    format: DdsFormat,
    mipmap_count: Option<usize>,
}

impl DdsEncoder {
    /// Encoder producing a full mipmap chain down to 1×1.
    pub fn new(format: DdsFormat) -> Self {
        Self {
            format,
            mipmap_count: None,
        }
    }

    /// Limit the number of surfaces written, including the base level.
    pub fn with_mipmap_count(mut self, count: usize) -> Self {
        self.mipmap_count = Some(count.max(1));
        self
    }

    pub fn format(&self) -> DdsFormat {
        self.format
    }

    /// Encode `image` as a complete DDS file (header + all surfaces).
    pub fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>, DdsError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(DdsError::InvalidDimensions(width, height));
        }

        let levels = build_chain(image, self.mipmap_count);
        let header = DdsHeader::new(width, height, levels.len() as u32, self.format);

        let body: usize = levels
            .iter()
            .map(|l| self.format.surface_bytes(l.width(), l.height()))
            .sum();
        let mut out = Vec::with_capacity(DDS_HEADER_LEN + body);
        out.extend_from_slice(&header.to_bytes());
        for level in &levels {
            out.extend_from_slice(&self.compress_surface(level));
        }
        Ok(out)
    }

    fn compress_surface(&self, image: &RgbaImage) -> Vec<u8> {
        let blocks_wide = image.width().div_ceil(4);
        let blocks_high = image.height().div_ceil(4);
        let format = self.format;

        (0..blocks_high)
            .into_par_iter()
            .flat_map_iter(|by| {
                let mut row = Vec::with_capacity(blocks_wide as usize * format.block_bytes());
                for bx in 0..blocks_wide {
                    let block = gather_block(image, bx, by);
                    match format {
                        DdsFormat::BC1 => row.extend_from_slice(&encode_bc1(&block)),
                        DdsFormat::BC3 => row.extend_from_slice(&encode_bc3(&block)),
                    }
                }
                row
            })
            .collect()
    }
}

/// Copy a 4×4 block, padding past the edge with transparent black.
fn gather_block(image: &RgbaImage, bx: u32, by: u32) -> Block {
    let mut block = [[0u8; 4]; 16];
    for y in 0..4 {
        for x in 0..4 {
            let (px, py) = (bx * 4 + x, by * 4 + y);
            if px < image.width() && py < image.height() {
                block[(y * 4 + x) as usize] = image.get_pixel(px, py).0;
            }
        }
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_single_level_bc1_size() {
        let image = RgbaImage::new(8, 8);
        let bytes = DdsEncoder::new(DdsFormat::BC1)
            .with_mipmap_count(1)
            .encode(&image)
            .unwrap();
        assert_eq!(bytes.len(), DDS_HEADER_LEN + 4 * 8);
        assert_eq!(&bytes[0..4], b"DDS ");
    }

    #[test]
    fn test_full_chain_bc3_size() {
        let image = RgbaImage::from_pixel(16, 16, Rgba([90, 120, 30, 255]));
        let bytes = DdsEncoder::new(DdsFormat::BC3).encode(&image).unwrap();
        // 16,8,4,2,1: 16 + 4 + 1 + 1 + 1 blocks
        assert_eq!(bytes.len(), DDS_HEADER_LEN + 23 * 16);

        let header = DdsHeader::parse(&bytes).unwrap();
        assert_eq!(header.width, 16);
        assert_eq!(header.height, 16);
        assert_eq!(header.mipmap_count, 5);
        assert_eq!(header.format, DdsFormat::BC3);
    }

    #[test]
    fn test_non_multiple_of_four() {
        let image = RgbaImage::new(6, 5);
        let bytes = DdsEncoder::new(DdsFormat::BC1)
            .with_mipmap_count(1)
            .encode(&image)
            .unwrap();
        assert_eq!(bytes.len(), DDS_HEADER_LEN + 4 * 8);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let image = RgbaImage::new(0, 4);
        assert!(matches!(
            DdsEncoder::new(DdsFormat::BC1).encode(&image),
            Err(DdsError::InvalidDimensions(0, 4))
        ));
    }

    #[test]
    fn test_gather_block_pads_edges() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4]));
        let block = gather_block(&image, 0, 0);
        assert_eq!(block[0], [1, 2, 3, 4]);
        assert_eq!(block[5], [1, 2, 3, 4]);
        assert_eq!(block[2], [0, 0, 0, 0]);
        assert_eq!(block[15], [0, 0, 0, 0]);
    }
}
