use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_MAX_ENTRIES: usize = 20_000;
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 1024 * 1024 * 1024;

/// Ceilings applied to every archive regardless of its contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractLimits {
    pub max_entries: usize,
    pub max_total_bytes: u64,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
        }
    }
}

#[derive(Clone, Default)]
pub struct ExtractOptions {
    pub limits: ExtractLimits,
    pub on_progress: Option<Arc<dyn Fn(Progress) + Send + Sync>>,
}

#[derive(Clone, Debug)]
pub struct Progress {
    pub entries_processed: usize,
    pub entry_count: usize,
    pub bytes_processed: u64,
    pub current_file: Option<PathBuf>,
}

impl ExtractOptions {
    pub fn max_entries(mut self, n: usize) -> Self {
        self.limits.max_entries = n;
        self
    }

    pub fn max_total_bytes(mut self, bytes: u64) -> Self {
        self.limits.max_total_bytes = bytes;
        self
    }

    pub fn on_progress(mut self, callback: Arc<dyn Fn(Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(callback);
        self
    }
}

impl Progress {
    pub fn percentage(&self) -> Option<f32> {
        if self.entry_count == 0 {
            None
        } else {
            Some((self.entries_processed as f32 / self.entry_count as f32) * 100.0)
        }
    }
}
