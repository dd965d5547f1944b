use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A staging directory that becomes `destination` on [`Workspace::commit`].
///
/// The staging directory is created as a sibling of the destination so the final
/// move is a same-filesystem rename. Dropping an uncommitted workspace removes it.
pub struct Workspace {
    staging_path: PathBuf,
    destination_path: PathBuf,
    committed: bool,
}

impl Workspace {
    pub fn new(destination: impl AsRef<Path>) -> Result<Self> {
        let destination_path = destination.as_ref().to_path_buf();
        let parent = destination_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| Error::NoParent(destination_path.clone()))?;

        let staging_path = parent.join(format!(".staging.{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&staging_path).map_err(|e| Error::CreateDir {
            path: staging_path.clone(),
            source: e,
        })?;

        Ok(Self {
            staging_path,
            destination_path,
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.staging_path
    }

    pub fn destination(&self) -> &Path {
        &self.destination_path
    }

    /// Replace the destination with the staged tree.
    pub fn commit(mut self) -> Result<PathBuf> {
        if self.destination_path.exists() {
            fs::remove_dir_all(&self.destination_path).map_err(|e| Error::Remove {
                path: self.destination_path.clone(),
                source: e,
            })?;
        }

        fs::rename(&self.staging_path, &self.destination_path).map_err(|e| Error::Rename {
            from: self.staging_path.clone(),
            to: self.destination_path.clone(),
            source: e,
        })?;

        self.committed = true;
        Ok(self.destination_path.clone())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_dir_all(&self.staging_path);
        }
    }
}
