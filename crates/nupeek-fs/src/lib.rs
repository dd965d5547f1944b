//! Filesystem primitives shared by the cache and catalog layers.
//!
//! - [`atomic_write`] replaces a whole file through a sibling temp file and a rename.
//! - [`Workspace`] stages a directory tree next to its destination and swaps it in on commit.

mod atomic;
mod error;
mod workspace;

pub use atomic::{AtomicWriteOptions, atomic_write, dir_has_entries, read_optional};
pub use error::{Error, Result};
pub use workspace::Workspace;
