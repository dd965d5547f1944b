//! Zip extraction with entry-count and size ceilings.
//!
//! Every entry name is sanitized and the declared sizes are summed before anything is
//! written. The byte ceiling is enforced again while decompressing, because declared
//! sizes in a hostile archive cannot be trusted.

use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::entry::{ArchiveReport, Entry, EntryKind};
use crate::error::{Error, Result};
use crate::options::{ExtractOptions, Progress};
use crate::sanitize::{SanitizedPath, sanitize_entry_path};
use crate::workspace::extract_to_workspace;

struct PlannedEntry {
    index: usize,
    path: SanitizedPath,
    kind: EntryKind,
}

/// Extract the zip read from `reader` into `destination`, which must already exist.
///
/// On error the destination may hold a partial tree; use [`extract_file`] or
/// [`extract_to_workspace`](crate::extract_to_workspace) to avoid that.
pub fn extract_from_reader<R: Read + Seek>(
    reader: R,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<ArchiveReport> {
    let mut archive = ZipArchive::new(reader).map_err(Error::Corrupted)?;
    let limits = options.limits;

    let entry_count = archive.len();
    if entry_count > limits.max_entries {
        return Err(Error::TooManyEntries {
            count: entry_count,
            limit: limits.max_entries,
        });
    }

    let plan = plan_entries(&mut archive, destination, limits.max_total_bytes)?;

    let mut report = ArchiveReport {
        entry_count,
        ..ArchiveReport::default()
    };

    for (processed, planned) in plan.into_iter().enumerate() {
        let size = match planned.kind {
            EntryKind::Directory => {
                ensure_directory(&planned.path.resolved)?;
                0
            }
            EntryKind::File => {
                let remaining = limits.max_total_bytes - report.total_bytes;
                let mut file = archive.by_index(planned.index).map_err(Error::Corrupted)?;
                write_file(&mut file, &planned.path.resolved, remaining, limits.max_total_bytes)?
            }
        };
        report.total_bytes += size;

        if let Some(callback) = &options.on_progress {
            callback(Progress {
                entries_processed: processed + 1,
                entry_count,
                bytes_processed: report.total_bytes,
                current_file: Some(planned.path.relative.clone()),
            });
        }

        report.entries.push(Entry {
            original_path: planned.path.original,
            relative_path: planned.path.relative,
            size,
            kind: planned.kind,
        });
    }

    tracing::debug!(
        destination = %destination.display(),
        entries = report.entry_count,
        bytes = report.total_bytes,
        "extracted archive"
    );

    Ok(report)
}

/// Extract the archive at `archive_path` so that `destination` holds exactly its contents.
///
/// Extraction is staged next to the destination and only moved into place on success.
#[tracing::instrument(skip_all, fields(archive = %archive_path.display(), destination = %destination.display()))]
pub fn extract_file(
    archive_path: &Path,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<ArchiveReport> {
    let file = File::open(archive_path).map_err(|e| Error::ExtractionFailed {
        path: archive_path.to_path_buf(),
        source: e,
    })?;
    let reader = io::BufReader::new(file);
    extract_to_workspace(reader, destination, options)?.commit()
}

fn plan_entries<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    destination: &Path,
    max_total_bytes: u64,
) -> Result<Vec<PlannedEntry>> {
    let mut plan = Vec::with_capacity(archive.len());
    let mut declared_total = 0u64;

    for index in 0..archive.len() {
        let raw = archive.by_index_raw(index).map_err(Error::Corrupted)?;
        let name = raw.name().to_string();
        let kind = if raw.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        let path = sanitize_entry_path(&name, destination)?;
        if path.relative.as_os_str().is_empty() {
            match kind {
                EntryKind::Directory => continue,
                EntryKind::File => return Err(Error::ZipSlip { entry: name }),
            }
        }

        if kind == EntryKind::File {
            declared_total = declared_total.saturating_add(raw.size());
            if declared_total > max_total_bytes {
                return Err(Error::SizeLimitExceeded {
                    limit: max_total_bytes,
                });
            }
        }

        plan.push(PlannedEntry { index, path, kind });
    }

    Ok(plan)
}

fn write_file<R: Read>(reader: &mut R, target: &Path, remaining: u64, limit: u64) -> Result<u64> {
    if let Some(parent) = target.parent() {
        ensure_directory(parent)?;
    }

    let mut out = File::create(target).map_err(|e| Error::ExtractionFailed {
        path: target.to_path_buf(),
        source: e,
    })?;

    let mut bounded = reader.take(remaining.saturating_add(1));
    let written = io::copy(&mut bounded, &mut out).map_err(|e| Error::ExtractionFailed {
        path: target.to_path_buf(),
        source: e,
    })?;

    if written > remaining {
        drop(out);
        let _ = fs::remove_file(target);
        return Err(Error::SizeLimitExceeded { limit });
    }

    Ok(written)
}

fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::DirectoryCreationFailed {
        path: PathBuf::from(path),
        source: e,
    })
}
