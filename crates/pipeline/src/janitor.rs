//! Workspace janitor: prunes scratch state of completed assets.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::completion::CompletionSet;
use crate::error::PipelineError;

/// Reconciles the scratch workspace against the completion set.
#[derive(Debug, Clone)]
pub struct WorkspaceJanitor {
    scratch_root: PathBuf,
}

impl WorkspaceJanitor {
    pub fn new(scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: scratch_root.into(),
        }
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Deletes every entry directory whose name is in `completion`.
    ///
    /// Files and directories of other assets are left untouched. A missing
    /// scratch root is created. Returns the removed directories, sorted.
    pub fn run(&self, completion: &CompletionSet) -> Result<Vec<PathBuf>, PipelineError> {
        fs::create_dir_all(&self.scratch_root)
            .map_err(|e| PipelineError::io(&self.scratch_root, e))?;

        let entries = fs::read_dir(&self.scratch_root)
            .map_err(|e| PipelineError::io(&self.scratch_root, e))?;

        let mut removed = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::io(&self.scratch_root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !completion.contains(&name) {
                debug!("Keeping scratch entry {}", name);
                continue;
            }
            info!("Cleanup {}", path.display());
            fs::remove_dir_all(&path).map_err(|e| PipelineError::io(&path, e))?;
            removed.push(path);
        }

        removed.sort();
        Ok(removed)
    }
}
