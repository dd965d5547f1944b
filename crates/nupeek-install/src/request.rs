use std::path::PathBuf;

use nupeek_locate::{MatchKind, TargetSpec};
use serde::Serialize;

use crate::progress::Phase;

/// Version sentinel meaning "latest stable".
pub const LATEST_VERSION: &str = "latest";
/// Target framework sentinel meaning "pick the best available".
pub const AUTO_TFM: &str = "auto";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunRequest {
    pub package_id: String,
    pub version: Option<String>,
    pub tfm: Option<String>,
    pub target: TargetSpec,
    pub output_root: PathBuf,
}

impl RunRequest {
    pub fn new(package_id: impl Into<String>, target: TargetSpec, output_root: impl Into<PathBuf>) -> Self {
        Self {
            package_id: package_id.into(),
            version: None,
            tfm: None,
            target,
            output_root: output_root.into(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn tfm(mut self, tfm: impl Into<String>) -> Self {
        self.tfm = Some(tfm.into());
        self
    }

    /// Requested version with blanks and `latest` folded to `None`.
    pub fn explicit_version(&self) -> Option<&str> {
        without_sentinel(self.version.as_deref(), LATEST_VERSION)
    }

    /// Requested framework with blanks and `auto` folded to `None`.
    pub fn explicit_tfm(&self) -> Option<&str> {
        without_sentinel(self.tfm.as_deref(), AUTO_TFM)
    }
}

fn without_sentinel<'a>(value: Option<&'a str>, sentinel: &str) -> Option<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(sentinel))
}

/// What a run would do, computed without touching the filesystem or network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPlan {
    pub package_id: String,
    pub version: String,
    pub tfm: String,
    pub target: TargetSpec,
    pub output_root: PathBuf,
    pub cache_root: PathBuf,
    pub steps: Vec<Phase>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub package_id: String,
    pub version: String,
    pub tfm: String,
    pub type_name: String,
    pub match_kind: MatchKind,
    pub assembly_path: PathBuf,
    pub output_path: PathBuf,
    pub index_path: PathBuf,
    pub manifest_path: PathBuf,
}
