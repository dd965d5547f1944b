use std::future::Future;

use nupeek_version::PackageVersion;

use crate::error::Result;

/// A remote package feed.
///
/// Only two questions are ever asked of a source: which versions of a package it
/// offers, and the archive bytes of one exact version.
pub trait PackageSource: Send + Sync {
    /// Human-readable label used in logs.
    fn name(&self) -> &str;

    /// Stable, listed versions of `id`. An unknown package yields an empty list.
    fn list_versions(&self, id: &str) -> impl Future<Output = Result<Vec<PackageVersion>>> + Send;

    /// Append the archive for `id`/`version` to `sink`.
    ///
    /// Returns `Ok(false)` when this source does not carry that exact identity.
    fn copy_archive(
        &self,
        id: &str,
        version: &PackageVersion,
        sink: &mut Vec<u8>,
    ) -> impl Future<Output = Result<bool>> + Send;
}

impl<S: PackageSource> PackageSource for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn list_versions(&self, id: &str) -> impl Future<Output = Result<Vec<PackageVersion>>> + Send {
        (**self).list_versions(id)
    }

    fn copy_archive(
        &self,
        id: &str,
        version: &PackageVersion,
        sink: &mut Vec<u8>,
    ) -> impl Future<Output = Result<bool>> + Send {
        (**self).copy_archive(id, version, sink)
    }
}
