use std::path::PathBuf;

/// An archive entry as it was written to disk.
#[derive(Clone, Debug)]
pub struct Entry {
    pub original_path: String,
    pub relative_path: PathBuf,
    pub size: u64,
    pub kind: EntryKind,
}

impl Entry {
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Clone, Debug, Default)]
pub struct ArchiveReport {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub entries: Vec<Entry>,
}

impl ArchiveReport {
    pub fn files(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_file())
    }
}
