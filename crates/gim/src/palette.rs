/// One palette entry in R, G, B, A byte order.
pub type Color = [u8; 4];

/// Number of entries in the palette region, for both 4bpp and 8bpp textures
pub const PALETTE_LEN: usize = 256;
/// Size of the palette region (in bytes)
pub const PALETTE_SIZE: usize = PALETTE_LEN * 4;

/// Largest alpha the console stores; it stands for fully opaque.
pub const MAX_STORED_ALPHA: u8 = 128;

const COLORS: usize = 8;
const STRIPES: usize = 2;
const BLOCKS: usize = 2;
const PART: usize = COLORS * STRIPES * BLOCKS;

/// Position read for output slot `i`. Within every 32 entries the second and
/// third runs of eight trade places.
#[inline]
fn interleaved_index(i: usize) -> usize {
    let part = i / PART;
    let block = (i / (COLORS * STRIPES)) % BLOCKS;
    let stripe = (i / COLORS) % STRIPES;
    let color = i % COLORS;
    part * PART + block * COLORS + stripe * STRIPES * COLORS + color
}

/// Reorders palette entries between the on-disk interleaved order and linear
/// order. Entries past the last whole group of 32 are copied through.
pub fn filter_palette<T: Copy>(unfiltered: &[T]) -> Vec<T> {
    let parts = unfiltered.len() / PART;
    let mut filtered = Vec::with_capacity(unfiltered.len());
    for part in 0..parts {
        for block in 0..BLOCKS {
            for stripe in 0..STRIPES {
                for color in 0..COLORS {
                    filtered.push(
                        unfiltered
                            [part * PART + block * COLORS + stripe * STRIPES * COLORS + color],
                    );
                }
            }
        }
    }
    filtered.extend_from_slice(&unfiltered[parts * PART..]);
    filtered
}

/// Inverse of [`filter_palette`].
pub fn unfilter_palette<T: Copy>(filtered: &[T]) -> Vec<T> {
    let mut unfiltered = filtered.to_vec();
    let whole = filtered.len() / PART * PART;
    for (i, &entry) in filtered[..whole].iter().enumerate() {
        unfiltered[interleaved_index(i)] = entry;
    }
    unfiltered
}

/// Scales a stored 0..=128 alpha to 0..=255. Values above 128 are clamped first.
pub fn decode_alpha(stored: u8) -> u8 {
    let stored = stored.min(MAX_STORED_ALPHA);
    if stored > 0 {
        // 128 << 1 does not fit in a u8 before the subtraction
        ((u16::from(stored) << 1) - 1) as u8
    } else {
        0
    }
}

/// Scales a 0..=255 alpha down to the console's 0..=128 range.
///
/// Neighbouring inputs collapse onto the same stored value, so
/// `decode_alpha(encode_alpha(a))` is only `a` for odd `a`.
pub fn encode_alpha(alpha: u8) -> u8 {
    if alpha > 0 {
        (alpha >> 1) + 1
    } else {
        0
    }
}

pub fn read_palette(bytes: &[u8]) -> Vec<Color> {
    bytes
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect()
}

pub fn write_palette(palette: &[Color], out: &mut [u8]) {
    for (dst, color) in out.chunks_exact_mut(4).zip(palette) {
        dst.copy_from_slice(color);
    }
}
