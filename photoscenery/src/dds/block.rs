//! 4×4 block compression for BC1 and BC3.
//!
//! Colour endpoints come from the per-channel bounding box of the block and
//! each pixel picks the nearest of the four palette entries. BC3 adds an
//! eight-entry alpha ramp in front of the BC1 colour block.

/// Sixteen RGBA pixels in row-major order.
pub type Block = [[u8; 4]; 16];

fn pack_565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

fn unpack_565(c: u16) -> [u8; 3] {
    let r = ((c >> 11) & 0x1F) as u8;
    let g = ((c >> 5) & 0x3F) as u8;
    let b = (c & 0x1F) as u8;
    // Replicate high bits into the low bits
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

fn mix(a: [u8; 3], b: [u8; 3], wa: u16, wb: u16) -> [u8; 3] {
    let total = wa + wb;
    [
        ((a[0] as u16 * wa + b[0] as u16 * wb) / total) as u8,
        ((a[1] as u16 * wa + b[1] as u16 * wb) / total) as u8,
        ((a[2] as u16 * wa + b[2] as u16 * wb) / total) as u8,
    ]
}

fn distance_sq(p: &[u8; 4], c: &[u8; 3]) -> u32 {
    (0..3)
        .map(|i| {
            let d = p[i] as i32 - c[i] as i32;
            (d * d) as u32
        })
        .sum()
}

/// Compress one block to BC1 (8 bytes).
pub fn encode_bc1(block: &Block) -> [u8; 8] {
    let mut lo = [u8::MAX; 3];
    let mut hi = [u8::MIN; 3];
    for px in block {
        for ch in 0..3 {
            lo[ch] = lo[ch].min(px[ch]);
            hi[ch] = hi[ch].max(px[ch]);
        }
    }

    let mut c0 = pack_565(hi[0], hi[1], hi[2]);
    let mut c1 = pack_565(lo[0], lo[1], lo[2]);
    // c0 > c1 selects the opaque four-colour mode
    if c0 < c1 {
        std::mem::swap(&mut c0, &mut c1);
    }

    let e0 = unpack_565(c0);
    let e1 = unpack_565(c1);
    let palette = [e0, e1, mix(e0, e1, 2, 1), mix(e0, e1, 1, 2)];

    let mut indices = 0u32;
    for (i, px) in block.iter().enumerate() {
        let best = palette
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| distance_sq(px, c))
            .map(|(idx, _)| idx as u32)
            .unwrap_or(0);
        indices |= best << (i * 2);
    }

    let mut out = [0u8; 8];
    out[0..2].copy_from_slice(&c0.to_le_bytes());
    out[2..4].copy_from_slice(&c1.to_le_bytes());
    out[4..8].copy_from_slice(&indices.to_le_bytes());
    out
}

fn alpha_ramp(a0: u8, a1: u8) -> [u8; 8] {
    let (a0w, a1w) = (a0 as u16, a1 as u16);
    let step = |k: u16| ((a0w * (7 - k) + a1w * k) / 7) as u8;
    [a0, a1, step(1), step(2), step(3), step(4), step(5), step(6)]
}

/// Compress one block to BC3 (16 bytes).
pub fn encode_bc3(block: &Block) -> [u8; 16] {
    let a0 = block.iter().map(|px| px[3]).max().unwrap_or(u8::MAX);
    let a1 = block.iter().map(|px| px[3]).min().unwrap_or(u8::MAX);
    let ramp = alpha_ramp(a0, a1);

    let mut bits = 0u64;
    for (i, px) in block.iter().enumerate() {
        let best = ramp
            .iter()
            .enumerate()
            .min_by_key(|(_, a)| (px[3] as i16 - **a as i16).unsigned_abs())
            .map(|(idx, _)| idx as u64)
            .unwrap_or(0);
        bits |= best << (i * 3);
    }

    let mut out = [0u8; 16];
    out[0] = a0;
    out[1] = a1;
    out[2..8].copy_from_slice(&bits.to_le_bytes()[0..6]);
    out[8..16].copy_from_slice(&encode_bc1(block));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_565_extremes() {
        assert_eq!(pack_565(0, 0, 0), 0x0000);
        assert_eq!(pack_565(255, 255, 255), 0xFFFF);
        assert_eq!(unpack_565(0xFFFF), [255, 255, 255]);
        assert_eq!(unpack_565(pack_565(255, 0, 0)), [255, 0, 0]);
    }

    #[test]
    fn test_bc1_solid_block() {
        let block = [[255, 255, 255, 255]; 16];
        let out = encode_bc1(&block);
        assert_eq!(u16::from_le_bytes([out[0], out[1]]), 0xFFFF);
        assert_eq!(u16::from_le_bytes([out[2], out[3]]), 0xFFFF);
        assert_eq!(u32::from_le_bytes([out[4], out[5], out[6], out[7]]), 0);
    }

    #[test]
    fn test_bc1_two_colours_use_both_endpoints() {
        let mut block = [[0, 0, 0, 255]; 16];
        for px in block.iter_mut().skip(8) {
            *px = [255, 255, 255, 255];
        }
        let out = encode_bc1(&block);
        let c0 = u16::from_le_bytes([out[0], out[1]]);
        let c1 = u16::from_le_bytes([out[2], out[3]]);
        assert!(c0 > c1);
        let indices = u32::from_le_bytes([out[4], out[5], out[6], out[7]]);
        // First half black -> index 1, second half white -> index 0
        for i in 0..8 {
            assert_eq!((indices >> (i * 2)) & 0b11, 1);
        }
        for i in 8..16 {
            assert_eq!((indices >> (i * 2)) & 0b11, 0);
        }
    }

    #[test]
    fn test_bc3_alpha_endpoints() {
        let mut block = [[10, 20, 30, 255]; 16];
        block[0][3] = 0;
        let out = encode_bc3(&block);
        assert_eq!(out[0], 255);
        assert_eq!(out[1], 0);
        // Pixel 0 maps to alpha1 (index 1), the rest to alpha0 (index 0)
        let bits = u64::from_le_bytes([out[2], out[3], out[4], out[5], out[6], out[7], 0, 0]);
        assert_eq!(bits & 0b111, 1);
        assert_eq!((bits >> 3) & 0b111, 0);
        assert_eq!(&out[8..16], &encode_bc1(&block));
    }

    #[test]
    fn test_alpha_ramp_is_monotonic() {
        let ramp = alpha_ramp(210, 14);
        for w in ramp[2..].windows(2) {
            assert!(w[0] >= w[1]);
        }
        assert_eq!(ramp[0], 210);
        assert_eq!(ramp[1], 14);
    }
}
