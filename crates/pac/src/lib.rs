//! PAC archives: a flat entry table followed by 16-byte aligned payloads.

pub mod error;

use std::fs;
use std::path::{Path, PathBuf};

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info};

use crate::error::Error;

pub type Result<T> = core::result::Result<T, Error>;

pub const MAGIC: [u8; 4] = *b"PAC\0";
/// Size of the archive header (in bytes)
pub const HEADER_SIZE: usize = 32;
/// Size of one entry table record (in bytes)
pub const ENTRY_SIZE: usize = 32;
/// Fixed width of archive and entry names
pub const NAME_LEN: usize = 16;
/// Every payload starts on this boundary
pub const ALIGNMENT: usize = 16;

const DEFAULT_UNKNOWN2: u32 = 0x20;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileKind {
    Gim,
    Smd,
    Other(u32),
}

impl FileKind {
    pub const RAW_GIM: u32 = 0x01;
    pub const RAW_SMD: u32 = 0x03;
    pub const RAW_OTHER: u32 = 0x06;

    pub fn from_raw(raw: u32) -> Self {
        match raw {
            Self::RAW_GIM => Self::Gim,
            Self::RAW_SMD => Self::Smd,
            other => Self::Other(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            Self::Gim => Self::RAW_GIM,
            Self::Smd => Self::RAW_SMD,
            Self::Other(raw) => raw,
        }
    }

    /// Extension used when the entry is written to disk
    pub fn extension(self) -> String {
        match self {
            Self::Gim => "gim".to_string(),
            Self::Smd => "smd".to_string(),
            Self::Other(raw) => format!("{raw:03x}"),
        }
    }

    /// Inverse of [`FileKind::extension`]; unknown extensions map to the generic type.
    pub fn from_extension(ext: &str) -> Self {
        if ext.eq_ignore_ascii_case("gim") {
            return Self::Gim;
        }
        if ext.eq_ignore_ascii_case("smd") {
            return Self::Smd;
        }
        if ext.len() == 3 {
            if let Ok(raw) = u32::from_str_radix(ext, 16) {
                return Self::from_raw(raw);
            }
        }
        Self::Other(Self::RAW_OTHER)
    }

    /// Value of the entry's `extra` field for newly added entries. The game
    /// requires 1 on models.
    pub fn default_extra(self) -> u32 {
        match self {
            Self::Smd => 1,
            _ => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryMeta {
    pub name: String,
    pub offset: u32,
    pub length: u32,
    pub kind: FileKind,
    pub extra: u32,
}

impl EntryMeta {
    /// Name of the entry on disk, e.g. `TITLE.gim`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.kind.extension())
    }
}

#[derive(Clone, Debug)]
pub struct Archive {
    bytes: Vec<u8>,
    name: String,
    unknown1: u32,
    unknown2: u32,
    entries: Vec<EntryMeta>,
}

impl Archive {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(bytes)
    }

    pub fn parse(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < HEADER_SIZE || bytes[0..4] != MAGIC {
            let mut got = [0u8; 4];
            let n = bytes.len().min(4);
            got[..n].copy_from_slice(&bytes[..n]);
            return Err(Error::InvalidMagic { got });
        }

        let entry_count = LittleEndian::read_u32(&bytes[4..8]);
        let unknown1 = LittleEndian::read_u32(&bytes[8..12]);
        let unknown2 = LittleEndian::read_u32(&bytes[12..16]);
        let name = fixed_str(&bytes[16..32]);

        let table_end = u64::from(entry_count) * ENTRY_SIZE as u64 + HEADER_SIZE as u64;
        if table_end > bytes.len() as u64 {
            return Err(Error::TableOutOfBounds {
                entry_count,
                expected: table_end,
                file_size: bytes.len(),
            });
        }

        let entries = bytes[HEADER_SIZE..table_end as usize]
            .chunks_exact(ENTRY_SIZE)
            .enumerate()
            .map(|(index, chunk)| {
                let entry = EntryMeta {
                    name: fixed_str(&chunk[0..16]),
                    offset: LittleEndian::read_u32(&chunk[16..20]),
                    length: LittleEndian::read_u32(&chunk[20..24]),
                    kind: FileKind::from_raw(LittleEndian::read_u32(&chunk[24..28])),
                    extra: LittleEndian::read_u32(&chunk[28..32]),
                };
                let end = u64::from(entry.offset) + u64::from(entry.length);
                if end > bytes.len() as u64 {
                    return Err(Error::EntryOutOfBounds {
                        index,
                        offset: entry.offset,
                        length: entry.length,
                        file_size: bytes.len(),
                    });
                }
                Ok(entry)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("parsed PAC \"{}\" with {} entries", name, entries.len());
        Ok(Self {
            bytes,
            name,
            unknown1,
            unknown2,
            entries,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unknowns(&self) -> (u32, u32) {
        (self.unknown1, self.unknown2)
    }

    pub fn entries(&self) -> &[EntryMeta] {
        &self.entries
    }

    pub fn read(&self, index: usize) -> Option<&[u8]> {
        let entry = self.entries.get(index)?;
        let start = usize::try_from(entry.offset).ok()?;
        let end = start.checked_add(usize::try_from(entry.length).ok()?)?;
        self.bytes.get(start..end)
    }

    /// Writes every entry into `dir`, creating it if needed.
    pub fn extract_to(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| Error::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            let data = self.read(index).ok_or(Error::EntryOutOfBounds {
                index,
                offset: entry.offset,
                length: entry.length,
                file_size: self.bytes.len(),
            })?;
            let path = dir.join(entry.file_name());
            fs::write(&path, data).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            written.push(path);
        }

        info!("extracted {} entries into {}", written.len(), dir.display());
        Ok(written)
    }
}

/// Directory an archive is extracted into: the archive path with `_` appended.
pub fn extract_dir_for(archive: impl AsRef<Path>) -> PathBuf {
    let mut dir = archive.as_ref().as_os_str().to_os_string();
    dir.push("_");
    PathBuf::from(dir)
}

struct PendingEntry {
    name: [u8; NAME_LEN],
    kind: FileKind,
    extra: u32,
    data: Vec<u8>,
}

pub struct Builder {
    name: [u8; NAME_LEN],
    entries: Vec<PendingEntry>,
}

impl Builder {
    /// Archive names longer than 16 bytes are truncated to fit the header.
    pub fn new(name: &str) -> Self {
        let mut raw = [0u8; NAME_LEN];
        let bytes = name.as_bytes();
        let n = bytes.len().min(NAME_LEN);
        raw[..n].copy_from_slice(&bytes[..n]);
        Self {
            name: raw,
            entries: Vec::new(),
        }
    }

    /// Collects every regular file of a `<NAME>.PAC_` directory, sorted by
    /// file name. Returns the builder and the archive's file name, `<NAME>.PAC`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<(Self, String)> {
        let dir = dir.as_ref();
        let dir_name = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(stem) = dir_name
            .strip_suffix(".PAC_")
            .filter(|stem| !stem.is_empty())
        else {
            return Err(Error::InvalidDirectoryName {
                name: dir_name.clone(),
            });
        };

        let io_error = |source: std::io::Error| Error::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut builder = Self::new(stem);
        for path in files {
            builder.add_file(&path)?;
        }
        Ok((builder, format!("{stem}.PAC")))
    }

    pub fn add(&mut self, name: &str, kind: FileKind, data: Vec<u8>) -> Result<()> {
        if name.len() > NAME_LEN {
            return Err(Error::NameTooLong {
                name: name.to_string(),
                max: NAME_LEN,
            });
        }
        let mut raw = [0u8; NAME_LEN];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        self.entries.push(PendingEntry {
            name: raw,
            kind,
            extra: kind.default_extra(),
            data,
        });
        Ok(())
    }

    /// Adds a file, naming the entry after its stem and typing it by extension.
    pub fn add_file(&mut self, path: &Path) -> Result<()> {
        let data = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = path
            .extension()
            .map(|ext| FileKind::from_extension(&ext.to_string_lossy()))
            .unwrap_or(FileKind::Other(FileKind::RAW_OTHER));
        debug!("adding {} as {:?} ({} bytes)", path.display(), kind, data.len());
        self.add(&name, kind, data)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        let count = u32::try_from(self.entries.len()).map_err(|_| Error::TooManyEntries {
            got: self.entries.len(),
        })?;

        let table_end = HEADER_SIZE + ENTRY_SIZE * self.entries.len();
        let mut offsets = Vec::with_capacity(self.entries.len());
        let mut cursor = table_end;
        for entry in &self.entries {
            offsets.push(u32::try_from(cursor).map_err(|_| Error::IntegerOverflow)?);
            cursor = align(
                cursor
                    .checked_add(entry.data.len())
                    .ok_or(Error::IntegerOverflow)?,
            );
        }

        let mut out = vec![0u8; cursor];
        out[0..4].copy_from_slice(&MAGIC);
        LittleEndian::write_u32(&mut out[4..8], count);
        LittleEndian::write_u32(&mut out[8..12], 0);
        LittleEndian::write_u32(&mut out[12..16], DEFAULT_UNKNOWN2);
        out[16..32].copy_from_slice(&self.name);

        for (i, (entry, &offset)) in self.entries.iter().zip(&offsets).enumerate() {
            let length = u32::try_from(entry.data.len()).map_err(|_| Error::IntegerOverflow)?;
            let record = &mut out[HEADER_SIZE + i * ENTRY_SIZE..HEADER_SIZE + (i + 1) * ENTRY_SIZE];
            record[0..16].copy_from_slice(&entry.name);
            LittleEndian::write_u32(&mut record[16..20], offset);
            LittleEndian::write_u32(&mut record[20..24], length);
            LittleEndian::write_u32(&mut record[24..28], entry.kind.raw());
            LittleEndian::write_u32(&mut record[28..32], entry.extra);

            let start = offset as usize;
            out[start..start + entry.data.len()].copy_from_slice(&entry.data);
        }

        info!("built PAC with {} entries ({} bytes)", count, out.len());
        Ok(out)
    }
}

fn align(value: usize) -> usize {
    value.div_ceil(ALIGNMENT) * ALIGNMENT
}

fn fixed_str(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[cfg(test)]
mod tests;
