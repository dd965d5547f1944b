use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nupeek_fs::{AtomicWriteOptions, atomic_write, read_optional};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::manifest::ManifestEntry;

pub const INDEX_FILE: &str = "index.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// The catalog files under one output root.
#[derive(Clone, Debug)]
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn read_index(&self) -> Result<BTreeMap<String, String>> {
        load(&self.index_path())
    }

    pub fn read_manifest(&self) -> Result<Vec<ManifestEntry>> {
        load(&self.manifest_path())
    }

    /// Point `type_name` at `output_path`, replacing any previous mapping.
    #[tracing::instrument(skip(self, output_path))]
    pub fn upsert_index(&self, type_name: &str, output_path: &Path) -> Result<PathBuf> {
        let path = self.index_path();
        let mut index = self.read_index()?;
        index.insert(type_name.to_string(), output_path.to_string_lossy().into_owned());
        store(&path, &index)?;
        Ok(path)
    }

    /// Replace the entry sharing `entry`'s key in place, or append it.
    #[tracing::instrument(skip_all, fields(package = %entry.package_id, type_name = %entry.type_name))]
    pub fn upsert_manifest(&self, entry: ManifestEntry) -> Result<PathBuf> {
        let path = self.manifest_path();
        let mut manifest = self.read_manifest()?;
        match manifest.iter_mut().find(|existing| existing.same_key(&entry)) {
            Some(existing) => *existing = entry,
            None => manifest.push(entry),
        }
        store(&path, &manifest)?;
        Ok(path)
    }
}

/// Missing and blank files read as the empty collection.
fn load<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let Some(bytes) = read_optional(path)? else {
        return Ok(T::default());
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(&bytes).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn store<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_vec_pretty(value).map_err(Error::Serialize)?;
    json.push(b'\n');
    atomic_write(path, &json, AtomicWriteOptions::new().create_parent(true))?;
    tracing::debug!(path = %path.display(), bytes = json.len(), "catalog written");
    Ok(())
}
