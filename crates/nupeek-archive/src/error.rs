use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("archive has too many entries ({count}, limit {limit})")]
    TooManyEntries { count: usize, limit: usize },

    #[error("extracted size exceeds safety limit ({limit} bytes)")]
    SizeLimitExceeded { limit: u64 },

    #[error("zip-slip attack detected: entry '{entry}' escapes the destination")]
    ZipSlip { entry: String },

    #[error("entry path contains null byte: '{0}'")]
    InvalidPath(String),

    #[error("archive is corrupted: {0}")]
    Corrupted(#[source] zip::result::ZipError),

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("workspace operation failed: {0}")]
    Workspace(#[from] nupeek_fs::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether the archive itself was rejected as hostile, as opposed to a local I/O failure.
    pub fn is_safety_violation(&self) -> bool {
        matches!(
            self,
            Error::TooManyEntries { .. }
                | Error::SizeLimitExceeded { .. }
                | Error::ZipSlip { .. }
                | Error::InvalidPath(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
