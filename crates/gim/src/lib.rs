//! Codec for the indexed GIM textures of Initial D Special Stage.
//!
//! Decoding turns a GIM into row-major RGBA8; encoding writes a (quantized)
//! image back into an existing GIM, keeping every header byte it does not own.

pub mod codec;
pub mod error;
pub mod header;
pub mod palette;
pub mod pixels;
pub mod quantize;
pub mod swizzle;

pub use crate::codec::{DecodedImage, GimFile};
pub use crate::error::Error;
pub use crate::header::{GimHeader, PixelKind, HEADER_SIZE};
pub use crate::quantize::{ExactQuantizer, IndexedImage, Quantizer};

pub type Result<T> = core::result::Result<T, Error>;
