//! DDS texture output.
//!
//! Tiles can be stored as block-compressed DirectX surfaces instead of PNG.
//! Two formats are supported:
//!
//! - **BC1 (DXT1)**: 8 bytes per 4×4 block, RGB565 endpoints, 2-bit indices
//! - **BC3 (DXT5)**: 16 bytes per 4×4 block, adds an 8-step alpha ramp
//!
//! Mipmaps are produced with a 2×2 box filter. Block rows of each surface are
//! compressed in parallel on the rayon pool.
//!
//! ```no_run
//! use photoscenery::dds::{DdsEncoder, DdsFormat};
//! use image::RgbaImage;
//!
//! let image = RgbaImage::new(512, 512);
//! let bytes = DdsEncoder::new(DdsFormat::BC1).encode(&image).unwrap();
//! std::fs::write("tile.dds", bytes).unwrap();
//! ```

mod block;
mod encoder;
mod mipmap;
mod types;

pub use encoder::DdsEncoder;
pub use types::{DdsError, DdsFormat, DdsHeader, DDS_HEADER_LEN};

pub use mipmap::{build_chain, downsample};
