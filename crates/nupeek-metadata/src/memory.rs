use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::ModuleMetadata;
use crate::MetadataReader;

/// Serves preset metadata by path. Unknown paths read as unmanaged modules.
#[derive(Clone, Debug, Default)]
pub struct InMemoryReader {
    modules: HashMap<PathBuf, ModuleMetadata>,
}

impl InMemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, path: impl Into<PathBuf>, module: ModuleMetadata) -> Self {
        self.insert(path, module);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, module: ModuleMetadata) {
        self.modules.insert(path.into(), module);
    }
}

impl MetadataReader for InMemoryReader {
    fn read_module(&self, path: &Path) -> Result<ModuleMetadata> {
        self.modules.get(path).cloned().ok_or(Error::NotManaged)
    }
}
