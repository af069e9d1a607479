use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to access {path}")]
    #[diagnostic(code(libgim::io_error))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file is too small for a GIM header (must be at least {expected} bytes, received {received})")]
    #[diagnostic(code(libgim::header_too_small))]
    HeaderTooSmall { expected: usize, received: usize },

    #[error("invalid image dimensions: {width}x{height}")]
    #[diagnostic(code(libgim::invalid_dimensions))]
    InvalidDimensions { width: u32, height: u32 },

    #[error("8bpp texture is {width}x{height}, but the swizzle needs width a multiple of 16 and height a multiple of 4, both at most 4096")]
    #[diagnostic(code(libgim::unaligned_dimensions))]
    UnalignedDimensions { width: u32, height: u32 },

    #[error("unsupported image type 0x{kind:02X}")]
    #[diagnostic(
        code(libgim::unsupported_format),
        help("only 4bpp (0x14) and 8bpp (0x13) indexed textures are supported")
    )]
    UnsupportedFormat { kind: u16 },

    #[error("{region} region out of bounds: offset={offset}, size={size}, file_size={file_size}")]
    #[diagnostic(code(libgim::region_out_of_bounds))]
    RegionOutOfBounds {
        region: &'static str,
        offset: usize,
        size: usize,
        file_size: usize,
    },

    #[error("image size mismatch: image is {actual_width}x{actual_height}, but it needs to be {expected_width}x{expected_height} to be injected into the GIM")]
    #[diagnostic(code(libgim::dimension_mismatch))]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("palette has {colors} colors, but the texture type holds at most {capacity}")]
    #[diagnostic(code(libgim::palette_overflow))]
    PaletteOverflow { colors: usize, capacity: usize },

    #[error("palette index {index} does not fit a texture type holding {capacity} colors")]
    #[diagnostic(code(libgim::index_out_of_range))]
    IndexOutOfRange { index: u8, capacity: usize },

    #[error("pixel buffer holds {actual} samples, expected {expected}")]
    #[diagnostic(code(libgim::pixel_count_mismatch))]
    PixelCountMismatch { expected: usize, actual: usize },

    #[error("integer overflow")]
    #[diagnostic(code(libgim::integer_overflow))]
    IntegerOverflow,

    #[error("color quantization failed")]
    #[diagnostic(code(libgim::quantizer))]
    Quantizer(#[source] Box<dyn std::error::Error + Send + Sync>),
}
