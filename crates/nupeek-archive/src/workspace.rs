use std::io::{Read, Seek};
use std::path::Path;

use nupeek_fs::Workspace;

use crate::entry::ArchiveReport;
use crate::error::Result;
use crate::extract::extract_from_reader;
use crate::options::ExtractOptions;

/// An extraction staged beside its destination, awaiting [`commit`](Self::commit).
pub struct WorkspaceExtraction {
    workspace: Workspace,
    report: ArchiveReport,
}

impl WorkspaceExtraction {
    pub fn commit(self) -> Result<ArchiveReport> {
        self.workspace.commit()?;
        Ok(self.report)
    }

    pub fn abort(self) {
        drop(self.workspace);
    }

    pub fn report(&self) -> &ArchiveReport {
        &self.report
    }

    pub fn staging_path(&self) -> &Path {
        self.workspace.path()
    }
}

pub fn extract_to_workspace<R: Read + Seek>(
    reader: R,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<WorkspaceExtraction> {
    let workspace = Workspace::new(destination)?;
    let report = extract_from_reader(reader, workspace.path(), options)?;
    Ok(WorkspaceExtraction { workspace, report })
}
