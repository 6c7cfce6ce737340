//! Mipmap chain generation with a 2×2 box filter.

use image::{Rgba, RgbaImage};

/// Halve an image in both axes by averaging 2×2 pixel groups.
///
/// Odd trailing rows/columns are dropped; a 1-pixel axis stays at 1.
pub fn downsample(source: &RgbaImage) -> RgbaImage {
    let width = (source.width() / 2).max(1);
    let height = (source.height() / 2).max(1);
    let sx = if source.width() > 1 { 2 } else { 1 };
    let sy = if source.height() > 1 { 2 } else { 1 };

    RgbaImage::from_fn(width, height, |x, y| {
        let mut acc = [0u32; 4];
        let mut n = 0u32;
        for dy in 0..sy {
            for dx in 0..sx {
                let p = source.get_pixel(x * sx + dx, y * sy + dy);
                for ch in 0..4 {
                    acc[ch] += p[ch] as u32;
                }
                n += 1;
            }
        }
        Rgba(acc.map(|v| (v / n) as u8))
    })
}

/// The source followed by successively halved levels, `levels` in total.
///
/// `None` builds the full chain down to 1×1. The chain also stops early
/// once a level reaches 1×1.
pub fn build_chain(source: &RgbaImage, levels: Option<usize>) -> Vec<RgbaImage> {
    let max_levels = levels.unwrap_or(usize::MAX).max(1);
    let mut chain = vec![source.clone()];
    while chain.len() < max_levels {
        let last = &chain[chain.len() - 1];
        if last.width() <= 1 && last.height() <= 1 {
            break;
        }
        let next = downsample(last);
        chain.push(next);
    }
    chain
}
