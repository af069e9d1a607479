use std::collections::HashMap;

use thiserror::Error;

use crate::palette::Color;

/// Palette indices plus the linear palette they refer to. Alpha is 0..=255.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedImage {
    pub palette: Vec<Color>,
    pub indices: Vec<u8>,
}

/// Reduces an RGBA8 image to at most `max_colors` palette entries.
pub trait Quantizer {
    type Error: std::error::Error + Send + Sync + 'static;

    fn quantize(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        max_colors: u32,
    ) -> Result<IndexedImage, Self::Error>;
}

#[derive(Error, Debug)]
pub enum ExactQuantizerError {
    #[error("image uses more than {max_colors} distinct colors")]
    TooManyColors { max_colors: u32 },
    #[error("invalid pixel data length: expected multiple of 4 bytes, got {0}")]
    InvalidPixelDataLength(usize),
}

/// Lossless palette builder for images that already fit the palette.
///
/// Colors are numbered in order of first appearance.
#[derive(Copy, Clone, Debug, Default)]
pub struct ExactQuantizer;

impl Quantizer for ExactQuantizer {
    type Error = ExactQuantizerError;

    fn quantize(
        &self,
        rgba: &[u8],
        _width: u32,
        _height: u32,
        max_colors: u32,
    ) -> Result<IndexedImage, Self::Error> {
        if rgba.len() % 4 != 0 {
            return Err(ExactQuantizerError::InvalidPixelDataLength(rgba.len()));
        }

        let limit = usize::try_from(max_colors.min(256)).unwrap_or(256);
        let mut lookup: HashMap<Color, u8> = HashMap::new();
        let mut palette = Vec::new();
        let mut indices = Vec::with_capacity(rgba.len() / 4);

        for pixel in rgba.chunks_exact(4) {
            let color = [pixel[0], pixel[1], pixel[2], pixel[3]];
            let index = match lookup.get(&color) {
                Some(&index) => index,
                None => {
                    if palette.len() >= limit {
                        return Err(ExactQuantizerError::TooManyColors { max_colors });
                    }
                    let index = palette.len() as u8;
                    palette.push(color);
                    lookup.insert(color, index);
                    index
                }
            };
            indices.push(index);
        }

        Ok(IndexedImage { palette, indices })
    }
}
