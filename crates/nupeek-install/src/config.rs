use std::path::{Path, PathBuf};

use nupeek_fetch::{HttpClient, NuGetV3Source, SourceConfig, SourceEntry};
use serde::{Deserialize, Serialize};

use crate::decompile::CommandDecompiler;
use crate::error::ConfigError;

pub const CACHE_ROOT_ENV: &str = "NUPEEK_CACHE_ROOT";
pub const DECOMPILER_ENV: &str = "NUPEEK_DECOMPILER";

const DEFAULT_DECOMPILER: &str = "ilspycmd";

/// External decompiler invocation. The type name and assembly are appended as
/// `-t <type> <assembly>` after `args`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompilerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for DecompilerCommand {
    fn default() -> Self {
        Self {
            program: DEFAULT_DECOMPILER.to_string(),
            args: Vec::new(),
        }
    }
}

/// Run configuration.
///
/// ```toml
/// cache_root = "/var/cache/nupeek"
///
/// [decompiler]
/// program = "ilspycmd"
///
/// [[sources]]
/// name = "internal"
/// url = "https://feed.example.com/v3/index.json"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeekConfig {
    /// Package cache location; `<output_root>/.cache` when unset.
    pub cache_root: Option<PathBuf>,
    pub sources: Vec<SourceEntry>,
    pub decompiler: DecompilerCommand,
}

impl PeekConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Defaults overlaid with `NUPEEK_CACHE_ROOT` and `NUPEEK_DECOMPILER`.
    pub fn from_env() -> Self {
        Self::default().overlay_env(|key| std::env::var(key).ok())
    }

    /// Overlay environment-style overrides read through `lookup`. Blank values are ignored.
    pub fn overlay_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());

        if let Some(root) = lookup(CACHE_ROOT_ENV) {
            self.cache_root = Some(PathBuf::from(root.trim()));
        }
        if let Some(program) = lookup(DECOMPILER_ENV) {
            self.decompiler.program = program.trim().to_string();
        }
        self
    }

    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            sources: self.sources.clone(),
        }
    }

    /// One NuGet V3 source per effective feed, all sharing `client`.
    pub fn nuget_sources<C: HttpClient + Clone>(&self, client: C) -> Vec<NuGetV3Source<C>> {
        self.source_config()
            .effective_sources()
            .into_iter()
            .map(|entry| NuGetV3Source::new(entry.name, entry.url, client.clone()))
            .collect()
    }

    pub fn command_decompiler(&self) -> CommandDecompiler {
        CommandDecompiler::new(&self.decompiler.program).with_args(self.decompiler.args.clone())
    }
}
