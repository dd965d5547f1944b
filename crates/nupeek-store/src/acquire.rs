//! Resolve, download and extract a package into the cache.
//!
//! Every step is skipped when its output already exists, so acquiring the same
//! identity twice performs no network or archive work the second time.

use std::path::{Path, PathBuf};

use nupeek_archive::{ExtractLimits, ExtractOptions, extract_file};
use nupeek_fetch::{PackageSource, download, resolve_version};
use nupeek_fs::dir_has_entries;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::identity::{PackageId, validate_version};
use crate::layout::CacheLayout;

/// A package present in the cache with its archive extracted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcquiredPackage {
    pub id: PackageId,
    pub version: String,
    pub package_dir: PathBuf,
    pub archive_path: PathBuf,
    pub extracted_path: PathBuf,
}

pub struct Acquirer<S> {
    sources: Vec<S>,
    layout: CacheLayout,
    limits: ExtractLimits,
}

impl<S: PackageSource> Acquirer<S> {
    pub fn new(sources: Vec<S>, layout: CacheLayout) -> Self {
        Self {
            sources,
            layout,
            limits: ExtractLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ExtractLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn sources(&self) -> &[S] {
        &self.sources
    }

    /// Resolve, download and extract in one call.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn acquire(
        &self,
        id: &str,
        version: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<AcquiredPackage> {
        let id = PackageId::parse(id)?;
        let requested = validate_version(version)?;

        let version = self.resolve(&id, requested.as_deref(), cancel).await?;
        let package = self.prepare(&id, &version)?;
        self.ensure_archive(&package, cancel).await?;
        self.ensure_extracted(&package, cancel).await?;
        Ok(package)
    }

    /// Version to use for `id`: the requested one verbatim, or the latest stable listed.
    pub async fn resolve(
        &self,
        id: &PackageId,
        requested: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String> {
        Ok(resolve_version(&self.sources, id.as_str(), requested, cancel).await?)
    }

    /// Compute cache paths for `id`/`version` and create the package directory.
    pub fn prepare(&self, id: &PackageId, version: &str) -> Result<AcquiredPackage> {
        let package_dir = self.layout.package_dir(id.as_str(), version);
        std::fs::create_dir_all(&package_dir).map_err(|source| Error::CreateDir {
            path: package_dir.clone(),
            source,
        })?;

        Ok(AcquiredPackage {
            id: id.clone(),
            archive_path: self.layout.archive_path(id.as_str(), version),
            extracted_path: self.layout.extracted_path(id.as_str(), version),
            version: version.to_string(),
            package_dir,
        })
    }

    /// Download the archive unless it is already cached. Returns whether a download happened.
    pub async fn ensure_archive(&self, package: &AcquiredPackage, cancel: &CancellationToken) -> Result<bool> {
        if package.archive_path.is_file() {
            tracing::debug!(path = %package.archive_path.display(), "archive cache hit");
            return Ok(false);
        }

        download(
            &self.sources,
            package.id.as_str(),
            &package.version,
            &package.archive_path,
            cancel,
        )
        .await?;
        Ok(true)
    }

    /// Extract the archive unless a non-empty extraction already exists.
    /// Returns whether extraction happened.
    pub async fn ensure_extracted(&self, package: &AcquiredPackage, cancel: &CancellationToken) -> Result<bool> {
        if cancel.is_cancelled() {
            return Err(Error::Canceled);
        }

        let archive = package.archive_path.clone();
        let destination = package.extracted_path.clone();
        let options = ExtractOptions {
            limits: self.limits,
            on_progress: None,
        };

        let extracted = tokio::task::spawn_blocking(move || extract_if_needed(&archive, &destination, &options))
            .await??;
        Ok(extracted)
    }
}

#[tracing::instrument(skip_all, fields(archive = %archive.display(), destination = %destination.display()))]
fn extract_if_needed(archive: &Path, destination: &Path, options: &ExtractOptions) -> Result<bool> {
    if dir_has_entries(destination)? {
        tracing::debug!("extraction cache hit");
        return Ok(false);
    }

    if destination.exists() {
        tracing::info!("removing empty extraction directory");
        std::fs::remove_dir_all(destination).map_err(|source| nupeek_fs::Error::Remove {
            path: destination.to_path_buf(),
            source,
        })?;
    }

    let report = extract_file(archive, destination, options)?;
    tracing::info!(entries = report.entry_count, bytes = report.total_bytes, "extracted package");
    Ok(true)
}
