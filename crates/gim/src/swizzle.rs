//! 8bpp texel layout of the PS2 GS.
//!
//! Indexed-8 textures are uploaded as 32-bit texels, so every 16x4 run of
//! pixels is interleaved across four bytes of eight columns. The address
//! formula below is the fixed hardware pattern and only holds for widths that
//! are multiples of 16 and heights that are multiples of 4, up to 4096.

use crate::error::Error;
use crate::Result;

pub const MAX_DIMENSION: u32 = 4096;

/// Checks that `width`x`height` is a layout the swizzle is defined for.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    if width % 16 != 0 || height % 4 != 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::UnalignedDimensions { width, height });
    }
    Ok(())
}

/// Position in the swizzled buffer of the linear pixel (`x`, `y`).
#[inline(always)]
fn tiled_address(x: usize, y: usize, width: usize) -> usize {
    let block_location = (y & !0xF) * width + (x & !0xF) * 2;
    let swap_selector = (((y + 2) >> 2) & 0x1) * 4;
    let pos_y = (((y & !3) >> 1) + (y & 1)) & 0x7;
    let column_location = pos_y * width * 2 + ((x + swap_selector) & 0x7) * 4;
    let byte_num = ((y >> 1) & 1) + ((x >> 2) & 2);

    block_location + column_location + byte_num
}

/// Converts console-native tiled samples into a row-major buffer.
pub fn deswizzle(src: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let (w, h) = checked_len(src, width, height)?;
    let mut out = vec![0u8; w * h];
    for y in 0..h {
        let row = &mut out[y * w..(y + 1) * w];
        for (x, px) in row.iter_mut().enumerate() {
            *px = src[tiled_address(x, y, w)];
        }
    }
    Ok(out)
}

/// Converts a row-major buffer into the console-native tiled layout.
pub fn swizzle(src: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let (w, h) = checked_len(src, width, height)?;
    let mut out = vec![0u8; w * h];
    for (y, row) in src.chunks_exact(w).enumerate().take(h) {
        for (x, &px) in row.iter().enumerate() {
            out[tiled_address(x, y, w)] = px;
        }
    }
    Ok(out)
}

fn checked_len(src: &[u8], width: u32, height: u32) -> Result<(usize, usize)> {
    check_dimensions(width, height)?;
    let w = usize::try_from(width).map_err(|_| Error::IntegerOverflow)?;
    let h = usize::try_from(height).map_err(|_| Error::IntegerOverflow)?;
    if src.len() != w * h {
        return Err(Error::PixelCountMismatch {
            expected: w * h,
            actual: src.len(),
        });
    }
    Ok((w, h))
}
