use std::path::{Path, PathBuf};

use nupeek_fs::{AtomicWriteOptions, atomic_write};
use nupeek_version::PackageVersion;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::source::PackageSource;

/// Fetch the archive for `id`/`version` from the first source that has it and
/// persist it at `destination`.
///
/// Sources are tried in order; the rest are skipped after the first hit. A source
/// that errors is logged and skipped. If none can supply the bytes the result is
/// [`Error::DownloadFailed`], which is distinct from a missing package.
#[tracing::instrument(skip(sources, destination, cancel), fields(destination = %destination.display()))]
pub async fn download<S: PackageSource>(
    sources: &[S],
    id: &str,
    version: &str,
    destination: &Path,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    let parsed = PackageVersion::parse(version).map_err(|source| Error::InvalidVersion {
        version: version.to_string(),
        source,
    })?;

    for source in sources {
        let mut buffer = Vec::new();
        let copied = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Canceled),
            copied = source.copy_archive(id, &parsed, &mut buffer) => copied,
        };

        match copied {
            Ok(true) => {
                let target = destination.to_path_buf();
                let bytes = buffer.len();
                tokio::task::spawn_blocking(move || {
                    atomic_write(&target, &buffer, AtomicWriteOptions::new().create_parent(true))
                })
                .await??;
                tracing::info!(source = source.name(), bytes, "downloaded package archive");
                return Ok(destination.to_path_buf());
            }
            Ok(false) => {
                tracing::debug!(source = source.name(), "package not present on source");
            }
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "archive download failed");
            }
        }
    }

    Err(Error::DownloadFailed {
        id: id.to_string(),
        version: version.to_string(),
    })
}
