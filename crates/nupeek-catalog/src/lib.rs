//! Where decompiled output goes, and the two catalogs that record it.
//!
//! `index.json` maps a type name to its output file; `manifest.json` keeps one
//! provenance record per `(package, version, tfm, type)`. Both are rewritten whole
//! on every upsert. Concurrent writers against the same root can lose updates.

mod catalog;
mod error;
mod manifest;
mod path;

pub use catalog::{Catalog, INDEX_FILE, MANIFEST_FILE};
pub use error::{Error, Result};
pub use manifest::ManifestEntry;
pub use path::{OUTPUT_EXTENSION, output_path, sanitize_type_name};
