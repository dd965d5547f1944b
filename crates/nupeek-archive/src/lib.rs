//! Safe extraction of untrusted package archives.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Entry path normalization (zip-slip prevention)
//! - `options.rs` - Entry-count and byte ceilings, progress callback
//! - `extract.rs` - Bounded zip extraction
//! - `workspace.rs` - Extraction into a staging directory with atomic commit
//! - `entry.rs` - Extracted entry and report types

pub use entry::{ArchiveReport, Entry, EntryKind};
pub use error::{Error, Result};
pub use extract::{extract_file, extract_from_reader};
pub use options::{DEFAULT_MAX_ENTRIES, DEFAULT_MAX_TOTAL_BYTES, ExtractLimits, ExtractOptions, Progress};
pub use sanitize::{SanitizedPath, sanitize_entry_path};
pub use workspace::{WorkspaceExtraction, extract_to_workspace};

pub mod entry;
mod error;
mod extract;
pub mod options;
mod sanitize;
mod workspace;
