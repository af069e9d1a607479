use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to access {path}")]
    #[diagnostic(code(libpac::io_error))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a PAC file (magic {got:02X?})")]
    #[diagnostic(code(libpac::invalid_magic))]
    InvalidMagic { got: [u8; 4] },

    #[error("entry table out of bounds: {entry_count} entries need {expected} bytes, file has {file_size}")]
    #[diagnostic(code(libpac::table_out_of_bounds))]
    TableOutOfBounds {
        entry_count: u32,
        expected: u64,
        file_size: usize,
    },

    #[error("entry #{index} data out of bounds: offset={offset}, length={length}, file_size={file_size}")]
    #[diagnostic(code(libpac::entry_out_of_bounds))]
    EntryOutOfBounds {
        index: usize,
        offset: u32,
        length: u32,
        file_size: usize,
    },

    #[error("name \"{name}\" is longer than {max} bytes")]
    #[diagnostic(code(libpac::name_too_long))]
    NameTooLong { name: String, max: usize },

    #[error("invalid directory name \"{name}\"")]
    #[diagnostic(
        code(libpac::invalid_directory_name),
        help("the directory must be named <NAME>.PAC_")
    )]
    InvalidDirectoryName { name: String },

    #[error("too many entries: {got}")]
    #[diagnostic(code(libpac::too_many_entries))]
    TooManyEntries { got: usize },

    #[error("integer overflow")]
    #[diagnostic(code(libpac::integer_overflow))]
    IntegerOverflow,
}
