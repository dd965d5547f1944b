use std::path::PathBuf;

use thiserror::Error;

use crate::decompile::DecompileError;

/// Status reported for a successful run.
pub const STATUS_SUCCESS: i32 = 0;

/// Outcome classes with stable status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    PackageResolution,
    ArchiveSafety,
    SymbolNotFound,
    AmbiguousSymbol,
    Decompilation,
    Canceled,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> i32 {
        match self {
            ErrorKind::Internal => 1,
            ErrorKind::InvalidInput => 2,
            ErrorKind::PackageResolution | ErrorKind::ArchiveSafety => 3,
            ErrorKind::SymbolNotFound | ErrorKind::AmbiguousSymbol => 4,
            ErrorKind::Decompilation => 5,
            ErrorKind::Canceled => 130,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid package request: {0}")]
    InvalidPackage(#[source] nupeek_store::Error),

    #[error("package resolution failed: {0}")]
    PackageResolution(#[source] nupeek_store::Error),

    #[error("package archive rejected: {0}")]
    ArchiveSafety(#[source] nupeek_archive::Error),

    /// The package was fetched but has no usable `lib/` content.
    #[error("package content unusable: {0}")]
    PackageLayout(#[source] nupeek_locate::Error),

    #[error(transparent)]
    SymbolNotFound(nupeek_locate::Error),

    #[error(
        "symbol '{symbol}' is ambiguous: member '{member}' is declared by {}; pass a fully-qualified type name instead",
        .candidates.join(", ")
    )]
    AmbiguousSymbol {
        symbol: String,
        member: String,
        candidates: Vec<String>,
    },

    #[error(transparent)]
    Decompilation(#[from] DecompileError),

    #[error("failed to update catalog: {0}")]
    Catalog(#[from] nupeek_catalog::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("operation canceled")]
    Canceled,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidInput(_) | PipelineError::InvalidPackage(_) => ErrorKind::InvalidInput,
            PipelineError::PackageResolution(_) | PipelineError::PackageLayout(_) => {
                ErrorKind::PackageResolution
            }
            PipelineError::ArchiveSafety(_) => ErrorKind::ArchiveSafety,
            PipelineError::SymbolNotFound(_) => ErrorKind::SymbolNotFound,
            PipelineError::AmbiguousSymbol { .. } => ErrorKind::AmbiguousSymbol,
            PipelineError::Decompilation(_) => ErrorKind::Decompilation,
            PipelineError::Canceled => ErrorKind::Canceled,
            PipelineError::Catalog(_) | PipelineError::Io { .. } | PipelineError::Join(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn status_code(&self) -> i32 {
        self.kind().status_code()
    }
}

impl From<nupeek_store::Error> for PipelineError {
    fn from(err: nupeek_store::Error) -> Self {
        use nupeek_store::Error as Store;

        match err {
            Store::Canceled | Store::Fetch(nupeek_fetch::Error::Canceled) => PipelineError::Canceled,
            Store::InvalidPackageId(_)
            | Store::InvalidVersion { .. }
            | Store::Fetch(nupeek_fetch::Error::InvalidVersion { .. }) => PipelineError::InvalidPackage(err),
            Store::Archive(archive) if archive.is_safety_violation() => PipelineError::ArchiveSafety(archive),
            other => PipelineError::PackageResolution(other),
        }
    }
}

impl From<nupeek_locate::Error> for PipelineError {
    fn from(err: nupeek_locate::Error) -> Self {
        use nupeek_locate::Error as Locate;

        match err {
            Locate::AmbiguousSymbol {
                symbol,
                member,
                candidates,
            } => PipelineError::AmbiguousSymbol {
                symbol,
                member,
                candidates,
            },
            Locate::SymbolNotFound { .. } | Locate::TfmNotFound { .. } => PipelineError::SymbolNotFound(err),
            Locate::EmptySymbol => PipelineError::InvalidInput(err.to_string()),
            Locate::NoLibFolder(_) | Locate::NoTargetFrameworks(_) | Locate::NoCandidates | Locate::Io { .. } => {
                PipelineError::PackageLayout(err)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
