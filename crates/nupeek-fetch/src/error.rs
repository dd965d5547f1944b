//! Error types for nupeek-fetch.

use std::path::PathBuf;

use nupeek_version::VersionError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid package version '{version}': {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: VersionError,
    },

    #[error("package '{id}' was not found")]
    NotFound { id: String },

    #[error("unable to download package '{id}' version '{version}'")]
    DownloadFailed { id: String, version: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("service index at {url} has no {resource} resource")]
    MissingResource { url: String, resource: &'static str },

    #[error("failed to read source configuration {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid source configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to write package archive: {0}")]
    Write(#[from] nupeek_fs::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("operation canceled")]
    Canceled,
}

impl Error {
    pub(crate) fn http(url: &str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Http {
            url: url.to_string(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
