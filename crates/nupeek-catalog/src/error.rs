use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("catalog file {} is not valid JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Fs(#[from] nupeek_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
