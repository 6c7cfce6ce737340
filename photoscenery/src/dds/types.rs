//! DDS format types, header layout and errors.

use std::fmt;

/// Bytes in the magic number plus the 124-byte header.
pub const DDS_HEADER_LEN: usize = 128;

const MAGIC: &[u8; 4] = b"DDS ";
const HEADER_SIZE: u32 = 124;
const PIXEL_FORMAT_SIZE: u32 = 32;

// Header flags (DDSD_*)
const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_MIPMAPCOUNT: u32 = 0x20000;
const DDSD_LINEARSIZE: u32 = 0x80000;

// Pixel format flags (DDPF_*)
const DDPF_FOURCC: u32 = 0x4;

// Caps (DDSCAPS_*)
const DDSCAPS_COMPLEX: u32 = 0x8;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const DDSCAPS_MIPMAP: u32 = 0x40_0000;

/// Block compression format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DdsFormat {
    /// BC1/DXT1: 8 bytes per 4×4 block, no alpha
    BC1,
    /// BC3/DXT5: 16 bytes per 4×4 block, interpolated alpha
    #[default]
    BC3,
}

impl DdsFormat {
    /// Compressed size of one 4×4 block.
    pub fn block_bytes(&self) -> usize {
        match self {
            DdsFormat::BC1 => 8,
            DdsFormat::BC3 => 16,
        }
    }

    fn fourcc(&self) -> [u8; 4] {
        match self {
            DdsFormat::BC1 => *b"DXT1",
            DdsFormat::BC3 => *b"DXT5",
        }
    }

    fn from_fourcc(fourcc: &[u8]) -> Option<Self> {
        match fourcc {
            b"DXT1" => Some(DdsFormat::BC1),
            b"DXT5" => Some(DdsFormat::BC3),
            _ => None,
        }
    }

    /// Bytes needed for one surface of `width × height` pixels.
    pub fn surface_bytes(&self, width: u32, height: u32) -> usize {
        width.div_ceil(4) as usize * height.div_ceil(4) as usize * self.block_bytes()
    }
}

impl fmt::Display for DdsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdsFormat::BC1 => write!(f, "BC1"),
            DdsFormat::BC3 => write!(f, "BC3"),
        }
    }
}

impl std::str::FromStr for DdsFormat {
    type Err = DdsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bc1" | "dxt1" => Ok(DdsFormat::BC1),
            "bc3" | "dxt5" => Ok(DdsFormat::BC3),
            other => Err(DdsError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Errors raised while writing or reading DDS data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdsError {
    /// Zero-sized surface
    InvalidDimensions(u32, u32),
    /// Unknown compression or fourcc
    UnsupportedFormat(String),
    /// Header is short, has the wrong magic, or a bad size field
    InvalidHeader(String),
}

impl fmt::Display for DdsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DdsError::InvalidDimensions(w, h) => write!(f, "Invalid dimensions: {}×{}", w, h),
            DdsError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            DdsError::InvalidHeader(msg) => write!(f, "Invalid DDS header: {}", msg),
        }
    }
}

impl std::error::Error for DdsError {}

/// The fields of a DDS header this crate writes and reads back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdsHeader {
    pub width: u32,
    pub height: u32,
    pub mipmap_count: u32,
    pub format: DdsFormat,
}

impl DdsHeader {
    pub fn new(width: u32, height: u32, mipmap_count: u32, format: DdsFormat) -> Self {
        Self {
            width,
            height,
            mipmap_count,
            format,
        }
    }

    /// Serialise as magic + 124-byte little-endian header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let has_mips = self.mipmap_count > 1;
        let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_LINEARSIZE;
        let mut caps = DDSCAPS_TEXTURE;
        if has_mips {
            flags |= DDSD_MIPMAPCOUNT;
            caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
        }
        let linear_size = self.format.surface_bytes(self.width, self.height) as u32;

        let mut out = Vec::with_capacity(DDS_HEADER_LEN);
        out.extend_from_slice(MAGIC);
        for word in [
            HEADER_SIZE,
            flags,
            self.height,
            self.width,
            linear_size,
            0, // depth
            self.mipmap_count,
        ] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&[0u8; 44]); // reserved1
        out.extend_from_slice(&PIXEL_FORMAT_SIZE.to_le_bytes());
        out.extend_from_slice(&DDPF_FOURCC.to_le_bytes());
        out.extend_from_slice(&self.format.fourcc());
        out.extend_from_slice(&[0u8; 20]); // bit count and masks
        out.extend_from_slice(&caps.to_le_bytes());
        out.extend_from_slice(&[0u8; 16]); // caps2..caps4, reserved2
        out
    }

    /// Parse the leading 128 bytes of a DDS file.
    pub fn parse(bytes: &[u8]) -> Result<Self, DdsError> {
        if bytes.len() < DDS_HEADER_LEN {
            return Err(DdsError::InvalidHeader(format!(
                "{} bytes, need {}",
                bytes.len(),
                DDS_HEADER_LEN
            )));
        }
        if &bytes[0..4] != MAGIC {
            return Err(DdsError::InvalidHeader("bad magic".to_string()));
        }
        let word = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };
        if word(4) != HEADER_SIZE {
            return Err(DdsError::InvalidHeader(format!("size field {}", word(4))));
        }
        let format = DdsFormat::from_fourcc(&bytes[84..88]).ok_or_else(|| {
            DdsError::UnsupportedFormat(String::from_utf8_lossy(&bytes[84..88]).into_owned())
        })?;
        let (height, width) = (word(12), word(16));
        if width == 0 || height == 0 {
            return Err(DdsError::InvalidDimensions(width, height));
        }
        Ok(Self {
            width,
            height,
            mipmap_count: word(28).max(1),
            format,
        })
    }
}
