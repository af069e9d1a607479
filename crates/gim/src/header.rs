use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;
use crate::Result;

/// Size of the fixed GIM header (in bytes)
pub const HEADER_SIZE: usize = 80;

const MAGIC: core::ops::Range<usize> = 0..16;
const TITLE: core::ops::Range<usize> = 16..32;
const OPAQUE_LEAD: core::ops::Range<usize> = 32..48;
const WIDTH: usize = 48;
const HEIGHT: usize = 50;
const KIND: usize = 52;
const OPAQUE_MID: core::ops::Range<usize> = 54..60;
const DATA_OFFSET: usize = 60;
const OPAQUE_TAIL: core::ops::Range<usize> = 64..76;
const PALETTE_OFFSET: usize = 76;

/// Texture type stored in the header
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelKind {
    /// Two palette indices per byte, stored linearly
    Indexed4,
    /// One palette index per byte, stored swizzled
    Indexed8,
}

impl PixelKind {
    pub const RAW_INDEXED4: u16 = 0x14;
    pub const RAW_INDEXED8: u16 = 0x13;

    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            Self::RAW_INDEXED4 => Some(Self::Indexed4),
            Self::RAW_INDEXED8 => Some(Self::Indexed8),
            _ => None,
        }
    }

    pub fn raw(self) -> u16 {
        match self {
            Self::Indexed4 => Self::RAW_INDEXED4,
            Self::Indexed8 => Self::RAW_INDEXED8,
        }
    }

    /// Number of palette entries addressable by this type
    pub fn palette_capacity(self) -> usize {
        match self {
            Self::Indexed4 => 16,
            Self::Indexed8 => 256,
        }
    }

    /// Bytes occupied by the data region for a `width`x`height` image
    pub fn data_size(self, width: u16, height: u16) -> usize {
        let pixels = usize::from(width) * usize::from(height);
        match self {
            Self::Indexed4 => pixels.div_ceil(2),
            Self::Indexed8 => pixels,
        }
    }
}

/// Header bytes whose meaning is unknown. They are carried verbatim so that a
/// rewritten file differs from the original only where pixels and palette did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpaqueFields {
    /// unk1..unk3 followed by ten bytes of padding
    pub lead: [u8; 16],
    /// unk4..unk6
    pub mid: [u8; 6],
    /// unk7..unk12
    pub tail: [u8; 12],
}

impl OpaqueFields {
    /// The twelve unknown 16-bit fields in header order
    pub fn unknown_words(&self) -> [u16; 12] {
        let mut words = [0u16; 12];
        for (i, word) in words.iter_mut().take(3).enumerate() {
            *word = LittleEndian::read_u16(&self.lead[i * 2..]);
        }
        for (i, word) in words[3..6].iter_mut().enumerate() {
            *word = LittleEndian::read_u16(&self.mid[i * 2..]);
        }
        for (i, word) in words[6..].iter_mut().enumerate() {
            *word = LittleEndian::read_u16(&self.tail[i * 2..]);
        }
        words
    }
}

/// Stored data/palette offsets, relative to the start of the file
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RelativeOffsets {
    pub data: u32,
    pub palette: u32,
}

/// Data/palette offsets as absolute positions in a byte buffer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResolvedOffsets {
    pub data: usize,
    pub palette: usize,
}

impl RelativeOffsets {
    /// Converts to absolute positions in a buffer whose file starts at `base`.
    pub fn resolve(self, base: usize) -> Result<ResolvedOffsets> {
        let data = usize::try_from(self.data).map_err(|_| Error::IntegerOverflow)?;
        let palette = usize::try_from(self.palette).map_err(|_| Error::IntegerOverflow)?;
        Ok(ResolvedOffsets {
            data: base.checked_add(data).ok_or(Error::IntegerOverflow)?,
            palette: base.checked_add(palette).ok_or(Error::IntegerOverflow)?,
        })
    }
}

impl ResolvedOffsets {
    /// Inverse of [`RelativeOffsets::resolve`] for the same `base`.
    pub fn restore(self, base: usize) -> Result<RelativeOffsets> {
        let data = self.data.checked_sub(base).ok_or(Error::IntegerOverflow)?;
        let palette = self.palette.checked_sub(base).ok_or(Error::IntegerOverflow)?;
        Ok(RelativeOffsets {
            data: u32::try_from(data).map_err(|_| Error::IntegerOverflow)?,
            palette: u32::try_from(palette).map_err(|_| Error::IntegerOverflow)?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GimHeader {
    pub magic: [u8; 16],
    pub title: [u8; 16],
    pub width: u16,
    pub height: u16,
    /// Raw type code, kept even when unsupported so it can be reported
    pub kind_raw: u16,
    pub offsets: RelativeOffsets,
    pub opaque: OpaqueFields,
}

impl GimHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::HeaderTooSmall {
                expected: HEADER_SIZE,
                received: bytes.len(),
            });
        }

        let mut magic = [0u8; 16];
        magic.copy_from_slice(&bytes[MAGIC]);
        let mut title = [0u8; 16];
        title.copy_from_slice(&bytes[TITLE]);

        let mut opaque = OpaqueFields {
            lead: [0; 16],
            mid: [0; 6],
            tail: [0; 12],
        };
        opaque.lead.copy_from_slice(&bytes[OPAQUE_LEAD]);
        opaque.mid.copy_from_slice(&bytes[OPAQUE_MID]);
        opaque.tail.copy_from_slice(&bytes[OPAQUE_TAIL]);

        Ok(Self {
            magic,
            title,
            width: LittleEndian::read_u16(&bytes[WIDTH..]),
            height: LittleEndian::read_u16(&bytes[HEIGHT..]),
            kind_raw: LittleEndian::read_u16(&bytes[KIND..]),
            offsets: RelativeOffsets {
                data: LittleEndian::read_u32(&bytes[DATA_OFFSET..]),
                palette: LittleEndian::read_u32(&bytes[PALETTE_OFFSET..]),
            },
            opaque,
        })
    }

    /// Serializes the header into the first [`HEADER_SIZE`] bytes of `out`.
    pub fn write(&self, out: &mut [u8]) -> Result<()> {
        if out.len() < HEADER_SIZE {
            return Err(Error::HeaderTooSmall {
                expected: HEADER_SIZE,
                received: out.len(),
            });
        }

        out[MAGIC].copy_from_slice(&self.magic);
        out[TITLE].copy_from_slice(&self.title);
        out[OPAQUE_LEAD].copy_from_slice(&self.opaque.lead);
        LittleEndian::write_u16(&mut out[WIDTH..], self.width);
        LittleEndian::write_u16(&mut out[HEIGHT..], self.height);
        LittleEndian::write_u16(&mut out[KIND..], self.kind_raw);
        out[OPAQUE_MID].copy_from_slice(&self.opaque.mid);
        LittleEndian::write_u32(&mut out[DATA_OFFSET..], self.offsets.data);
        out[OPAQUE_TAIL].copy_from_slice(&self.opaque.tail);
        LittleEndian::write_u32(&mut out[PALETTE_OFFSET..], self.offsets.palette);
        Ok(())
    }

    pub fn kind(&self) -> Result<PixelKind> {
        PixelKind::from_raw(self.kind_raw).ok_or(Error::UnsupportedFormat {
            kind: self.kind_raw,
        })
    }

    /// Magic tag up to the first NUL, lossily decoded
    pub fn magic_str(&self) -> String {
        fixed_str(&self.magic)
    }

    /// Title up to the first NUL, lossily decoded
    pub fn title_str(&self) -> String {
        fixed_str(&self.title)
    }
}

fn fixed_str(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
