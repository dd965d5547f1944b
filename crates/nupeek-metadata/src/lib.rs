//! Structural reading of .NET assemblies.
//!
//! The locator only needs the names of the types a module defines and the names of
//! their members, so this crate reads exactly that: PE headers, the CLI header, the
//! metadata root, the `#Strings` heap and a handful of metadata tables. Nothing is
//! loaded or executed.

#![forbid(unsafe_code)]

mod clr;
mod error;
mod memory;
mod metadata;
mod model;
mod pe;
mod reader;
mod tables;

pub use crate::clr::ClrMetadataReader;
pub use crate::error::{Error, Result};
pub use crate::memory::InMemoryReader;
pub use crate::model::{MemberDefinition, MemberKind, ModuleMetadata, TypeDefinition};

use std::path::Path;

/// Source of type definitions for a module on disk.
///
/// The locator scans through this trait so that it can be exercised against
/// synthetic modules.
pub trait MetadataReader: Send + Sync {
    fn read_module(&self, path: &Path) -> Result<ModuleMetadata>;
}

impl<R: MetadataReader + ?Sized> MetadataReader for std::sync::Arc<R> {
    fn read_module(&self, path: &Path) -> Result<ModuleMetadata> {
        (**self).read_module(path)
    }
}
