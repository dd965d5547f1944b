use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a PE image")]
    NotPe,

    #[error("image has no CLI header")]
    NotManaged,

    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("unknown optional header magic 0x{0:04x}")]
    InvalidOptionalHeader(u16),

    #[error("RVA 0x{0:08x} is not inside any section")]
    RvaOutOfRange(u32),

    #[error("invalid metadata signature 0x{0:08x}")]
    InvalidMetadataSignature(u32),

    #[error("metadata stream {0} is missing")]
    MissingStream(&'static str),

    #[error("metadata stream {name} lies outside the metadata block")]
    StreamOutOfRange { name: String },

    #[error("invalid #Strings heap entry at index {0}")]
    InvalidString(u32),

    #[error("row {row} is out of range for table 0x{table:02x}")]
    RowOutOfRange { table: usize, row: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
