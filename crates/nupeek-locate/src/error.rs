use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("package does not contain a lib folder: {}", .0.display())]
    NoLibFolder(PathBuf),

    #[error("no target frameworks found under: {}", .0.display())]
    NoTargetFrameworks(PathBuf),

    #[error("at least one target framework candidate is required")]
    NoCandidates,

    #[error("requested TFM '{tfm}' not found in package")]
    TfmNotFound { tfm: String },

    #[error("symbol text is empty")]
    EmptySymbol,

    #[error("type or symbol '{symbol}' was not found in '{}'", .lib_dir.display())]
    SymbolNotFound { symbol: String, lib_dir: PathBuf },

    #[error(
        "symbol '{symbol}' is ambiguous: member '{member}' is declared by {}; pass a fully-qualified type name instead",
        .candidates.join(", ")
    )]
    AmbiguousSymbol {
        symbol: String,
        member: String,
        /// Distinct candidate type names, sorted ordinally, at most five.
        candidates: Vec<String>,
    },

    #[error("failed to list {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
