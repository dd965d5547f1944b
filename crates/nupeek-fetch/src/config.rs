use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_SOURCE_URL: &str = "https://api.nuget.org/v3/index.json";
const DEFAULT_SOURCE_NAME: &str = "nuget.org";

/// One configured package feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub name: String,
    pub url: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl SourceEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: true,
        }
    }

    fn nuget_org() -> Self {
        Self::new(DEFAULT_SOURCE_NAME, DEFAULT_SOURCE_URL)
    }
}

/// The list of feeds to consult, in priority order.
///
/// ```toml
/// [[sources]]
/// name = "internal"
/// url = "https://feed.example.com/v3/index.json"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

impl SourceConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Enabled sources in configured order, with nuget.org appended when no
    /// enabled entry already points at it.
    pub fn effective_sources(&self) -> Vec<SourceEntry> {
        let mut sources: Vec<SourceEntry> =
            self.sources.iter().filter(|s| s.enabled).cloned().collect();

        let has_nuget_org = sources
            .iter()
            .any(|s| s.url.to_ascii_lowercase().contains("nuget.org"));
        if !has_nuget_org {
            sources.push(SourceEntry::nuget_org());
        }
        sources
    }
}
