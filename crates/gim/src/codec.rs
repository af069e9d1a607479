use core::ops::Range;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::error::Error;
use crate::header::{GimHeader, PixelKind, ResolvedOffsets, HEADER_SIZE};
use crate::palette::{
    decode_alpha, encode_alpha, filter_palette, read_palette, unfilter_palette, write_palette,
    Color, MAX_STORED_ALPHA,
};
use crate::pixels::{expand_indices, pack_4bpp, unpack_4bpp};
use crate::quantize::{IndexedImage, Quantizer};
use crate::swizzle::{check_dimensions, deswizzle, swizzle};
use crate::Result;

/// A GIM file owns its bytes, so the file always starts at index 0.
const FILE_BASE: usize = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8: Vec<u8>,
}

/// Header fields resolved against the owning buffer.
#[derive(Clone, Debug)]
struct Layout {
    kind: PixelKind,
    offsets: ResolvedOffsets,
    data: Range<usize>,
    palette: Range<usize>,
}

#[derive(Clone, Debug)]
pub struct GimFile {
    bytes: Vec<u8>,
    header: GimHeader,
}

impl GimFile {
    pub fn parse(bytes: Vec<u8>) -> Result<Self> {
        let header = GimHeader::parse(&bytes)?;
        debug!(
            "loaded GIM: {}x{}, type=0x{:02X}, data=0x{:X}, palette=0x{:X}",
            header.width,
            header.height,
            header.kind_raw,
            header.offsets.data,
            header.offsets.palette
        );
        Ok(Self { bytes, header })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(bytes)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, &self.bytes).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn header(&self) -> &GimHeader {
        &self.header
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn kind(&self) -> Result<PixelKind> {
        self.header.kind()
    }

    /// Converts the texture to row-major RGBA8 with alpha in 0..=255.
    pub fn decode(&self) -> Result<DecodedImage> {
        let layout = self.layout()?;
        let (width, height) = (u32::from(self.header.width), u32::from(self.header.height));
        let data = &self.bytes[layout.data.clone()];
        let stored = read_palette(&self.bytes[layout.palette.clone()]);

        let (indices, palette) = match layout.kind {
            PixelKind::Indexed8 => (deswizzle(data, width, height)?, unfilter_palette(&stored)),
            PixelKind::Indexed4 => (unpack_4bpp(data, pixel_count(&self.header))?, stored),
        };
        debug!("materialized {} indices", indices.len());

        report_alpha_clamp(&palette);
        let rgba8 = expand_indices(&indices, &palette)?;
        info!("decoded {}x{} {:?} texture", width, height, layout.kind);

        Ok(DecodedImage {
            width,
            height,
            rgba8,
        })
    }

    /// Writes caller-supplied indices and linear palette into the file.
    ///
    /// Palette alpha is taken as 0..=255 and scaled down to the console range.
    /// A palette shorter than the type's capacity is padded with transparent black.
    pub fn encode_indexed(&mut self, image: &IndexedImage) -> Result<()> {
        let layout = self.layout()?;
        let capacity = layout.kind.palette_capacity();
        let expected = pixel_count(&self.header);

        if image.palette.len() > capacity {
            return Err(Error::PaletteOverflow {
                colors: image.palette.len(),
                capacity,
            });
        }
        if image.indices.len() != expected {
            return Err(Error::PixelCountMismatch {
                expected,
                actual: image.indices.len(),
            });
        }
        if let Some(&index) = image
            .indices
            .iter()
            .find(|&&index| usize::from(index) >= image.palette.len())
        {
            return Err(Error::IndexOutOfRange {
                index,
                capacity: image.palette.len(),
            });
        }

        let mut palette = scale_palette(&image.palette);
        if palette.len() < capacity {
            debug!(
                "palette has {} of {} colors, padding with transparent black",
                palette.len(),
                capacity
            );
            palette.resize(capacity, [0, 0, 0, 0]);
        }

        let (width, height) = (u32::from(self.header.width), u32::from(self.header.height));
        let (data, palette) = match layout.kind {
            PixelKind::Indexed8 => (
                swizzle(&image.indices, width, height)?,
                filter_palette(&palette),
            ),
            PixelKind::Indexed4 => (pack_4bpp(&image.indices)?, palette),
        };

        self.bytes[layout.data.clone()].copy_from_slice(&data);
        write_palette(&palette, &mut self.bytes[layout.palette.clone()]);

        self.header.offsets = layout.offsets.restore(FILE_BASE)?;
        self.header.write(&mut self.bytes[..HEADER_SIZE])?;
        info!("encoded {}x{} {:?} texture", width, height, layout.kind);
        Ok(())
    }

    /// Quantizes an RGBA8 image to the texture's palette capacity and writes it.
    pub fn encode_rgba<Q: Quantizer>(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
        quantizer: &Q,
    ) -> Result<()> {
        let (expected_width, expected_height) =
            (u32::from(self.header.width), u32::from(self.header.height));
        if width != expected_width || height != expected_height {
            return Err(Error::DimensionMismatch {
                expected_width,
                expected_height,
                actual_width: width,
                actual_height: height,
            });
        }

        let expected = pixel_count(&self.header) * 4;
        if rgba.len() != expected {
            return Err(Error::PixelCountMismatch {
                expected,
                actual: rgba.len(),
            });
        }

        let kind = self.kind()?;
        let capacity = kind.palette_capacity();
        debug!("reducing to {} colors", capacity);
        let max_colors = u32::try_from(capacity).map_err(|_| Error::IntegerOverflow)?;
        let image = quantizer
            .quantize(rgba, width, height, max_colors)
            .map_err(|err| Error::Quantizer(Box::new(err)))?;

        self.encode_indexed(&image)
    }

    fn layout(&self) -> Result<Layout> {
        let header = &self.header;
        let (width, height) = (u32::from(header.width), u32::from(header.height));
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }

        let kind = header.kind()?;
        if kind == PixelKind::Indexed8 {
            check_dimensions(width, height)?;
        }

        let offsets = header.offsets.resolve(FILE_BASE)?;
        let data = checked_region(
            "data",
            offsets.data,
            kind.data_size(header.width, header.height),
            self.bytes.len(),
        )?;
        let palette = checked_region(
            "palette",
            offsets.palette,
            kind.palette_capacity() * 4,
            self.bytes.len(),
        )?;
        debug!("resolved {:?}: data={:?}, palette={:?}", kind, data, palette);

        Ok(Layout {
            kind,
            offsets,
            data,
            palette,
        })
    }
}

fn pixel_count(header: &GimHeader) -> usize {
    usize::from(header.width) * usize::from(header.height)
}

fn checked_region(
    region: &'static str,
    offset: usize,
    size: usize,
    file_size: usize,
) -> Result<Range<usize>> {
    let end = offset.checked_add(size).ok_or(Error::IntegerOverflow)?;
    if end > file_size {
        return Err(Error::RegionOutOfBounds {
            region,
            offset,
            size,
            file_size,
        });
    }
    Ok(offset..end)
}

fn scale_palette(palette: &[Color]) -> Vec<Color> {
    let mut lossy = 0usize;
    let scaled: Vec<Color> = palette
        .iter()
        .map(|&[r, g, b, a]| {
            let stored = encode_alpha(a);
            if decode_alpha(stored) != a {
                lossy += 1;
            }
            [r, g, b, stored]
        })
        .collect();
    if lossy > 0 {
        debug!("{lossy} palette alphas lose precision in the 0..=128 range");
    }
    scaled
}

fn report_alpha_clamp(palette: &[Color]) {
    let clamped = palette
        .iter()
        .filter(|color| color[3] > MAX_STORED_ALPHA)
        .count();
    if clamped > 0 {
        warn!("{clamped} palette entries store alpha above {MAX_STORED_ALPHA}, clamped to opaque");
    }
}
