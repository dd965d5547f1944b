use std::path::PathBuf;

use nupeek_version::VersionError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid package id '{0}'")]
    InvalidPackageId(String),

    #[error("invalid package version '{version}': {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: VersionError,
    },

    #[error(transparent)]
    Fetch(#[from] nupeek_fetch::Error),

    #[error("failed to extract package archive: {0}")]
    Archive(#[from] nupeek_archive::Error),

    #[error(transparent)]
    Fs(#[from] nupeek_fs::Error),

    #[error("failed to create cache directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("operation canceled")]
    Canceled,
}

pub type Result<T> = std::result::Result<T, Error>;
