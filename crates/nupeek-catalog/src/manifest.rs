use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Provenance of one generated file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub package_id: String,
    pub version: String,
    pub tfm: String,
    pub type_name: String,
    pub assembly_path: PathBuf,
    pub output_path: PathBuf,
    pub decompiled_at_utc: DateTime<Utc>,
}

impl ManifestEntry {
    /// Entries with the same key replace each other. Package id and tfm compare
    /// case-insensitively, version and type name ordinally.
    pub fn same_key(&self, other: &ManifestEntry) -> bool {
        self.package_id.eq_ignore_ascii_case(&other.package_id)
            && self.version == other.version
            && self.tfm.eq_ignore_ascii_case(&other.tfm)
            && self.type_name == other.type_name
    }
}
