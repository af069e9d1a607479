use crate::error::Error;
use crate::palette::{decode_alpha, Color};
use crate::Result;

/// Expands nibble-packed 4bpp data into one index per pixel. Even pixels read
/// the low nibble of byte `i / 2`, odd pixels the high nibble.
pub fn unpack_4bpp(packed: &[u8], pixel_count: usize) -> Result<Vec<u8>> {
    let needed = pixel_count.div_ceil(2);
    if packed.len() < needed {
        return Err(Error::PixelCountMismatch {
            expected: needed,
            actual: packed.len(),
        });
    }
    Ok((0..pixel_count)
        .map(|i| {
            let byte = packed[i / 2];
            if i % 2 != 0 {
                byte >> 4
            } else {
                byte & 0x0F
            }
        })
        .collect())
}

/// Packs two indices per byte as `index[2k] | index[2k + 1] << 4`.
///
/// Every index must be below 16; an odd trailing index keeps a zero high nibble.
pub fn pack_4bpp(indices: &[u8]) -> Result<Vec<u8>> {
    if let Some(&index) = indices.iter().find(|&&index| index > 0x0F) {
        return Err(Error::IndexOutOfRange {
            index,
            capacity: 16,
        });
    }
    Ok(indices
        .chunks(2)
        .map(|pair| pair[0] | pair.get(1).map_or(0, |hi| hi << 4))
        .collect())
}

/// Looks every index up in a linear palette and writes RGBA8 with the alpha
/// scaled to 0..=255.
pub fn expand_indices(indices: &[u8], palette: &[Color]) -> Result<Vec<u8>> {
    let mut rgba = Vec::with_capacity(indices.len() * 4);
    for &index in indices {
        let Some(&[r, g, b, a]) = palette.get(usize::from(index)) else {
            return Err(Error::IndexOutOfRange {
                index,
                capacity: palette.len(),
            });
        };
        rgba.extend_from_slice(&[r, g, b, decode_alpha(a)]);
    }
    Ok(rgba)
}
