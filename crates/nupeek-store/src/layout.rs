use std::path::{Path, PathBuf};

/// Deterministic paths inside the package cache:
/// `<root>/packages/<id-lower>/<version>/{<id-lower>.<version>.nupkg, extracted/}`.
///
/// The version string is used verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn package_dir(&self, id: &str, version: &str) -> PathBuf {
        self.root
            .join("packages")
            .join(id.to_lowercase())
            .join(version)
    }

    pub fn archive_path(&self, id: &str, version: &str) -> PathBuf {
        self.package_dir(id, version)
            .join(format!("{}.{}.nupkg", id.to_lowercase(), version))
    }

    pub fn extracted_path(&self, id: &str, version: &str) -> PathBuf {
        self.package_dir(id, version).join("extracted")
    }
}
