use gim::{IndexedImage, Quantizer};

/// Palette reduction through libimagequant.
#[derive(Copy, Clone, Debug)]
pub struct LiqQuantizer {
    pub quality: u8,
    pub speed: i32,
}

impl Quantizer for LiqQuantizer {
    type Error = imagequant::Error;

    fn quantize(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        max_colors: u32,
    ) -> Result<IndexedImage, Self::Error> {
        let mut attr = imagequant::new();
        attr.set_max_colors(max_colors)?;
        attr.set_quality(0, self.quality)?;
        attr.set_speed(self.speed)?;

        let pixels: Vec<imagequant::RGBA> = rgba
            .chunks_exact(4)
            .map(|pixel| imagequant::RGBA::new(pixel[0], pixel[1], pixel[2], pixel[3]))
            .collect();
        let mut image = attr.new_image(pixels, width as usize, height as usize, 0.)?;

        let mut quantized = attr.quantize(&mut image)?;
        quantized.set_dithering_level(1.0)?;
        let (palette, indices) = quantized.remapped(&mut image)?;

        if palette.len() != max_colors as usize {
            log::debug!(
                "constructed palette only has {} colors (room for {max_colors})",
                palette.len()
            );
        }

        Ok(IndexedImage {
            palette: palette.iter().map(|c| [c.r, c.g, c.b, c.a]).collect(),
            indices,
        })
    }
}
