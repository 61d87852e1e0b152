//! Scanner module for discovering source videos in a directory.
//!
//! Both pipelines work on the direct children of one directory; nothing is
//! walked recursively, so archived originals and scratch trees below the
//! source directory are never picked up again.

use log::warn;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::PipelineError;

/// Container extension both pipelines handle (case-insensitive matching).
pub const MEDIA_EXTENSION: &str = "mp4";

/// Substring marking in-flight staging files.
pub const STAGING_MARKER: &str = ".tmp.";

/// A source video discovered in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path to the video file.
    pub path: PathBuf,
    /// File size in bytes at discovery time.
    pub size_bytes: u64,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Checks if a file has the media extension (case-insensitive).
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(MEDIA_EXTENSION))
        .unwrap_or(false)
}

/// Checks if a file is a staging file left by an interrupted encode.
pub fn is_staging_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.contains(STAGING_MARKER))
        .unwrap_or(false)
}

/// Publish candidates follow the naming convention's `_crf<N>` tail.
pub fn is_publish_candidate(path: &Path) -> bool {
    is_media_file(path)
        && path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.contains("_crf"))
            .unwrap_or(false)
}

/// Lists the media files directly inside `dir`, sorted by file name.
///
/// Unreadable entries are logged and skipped; a missing directory is an error.
pub fn list_media_files(dir: &Path) -> Result<Vec<SourceFile>, PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::io(
            dir,
            io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error reading directory entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        // Only process files
        if !entry.file_type().is_file() || !is_media_file(entry.path()) {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => files.push(SourceFile {
                path: entry.path().to_path_buf(),
                size_bytes: metadata.len(),
            }),
            Err(e) => warn!("Failed to stat {}: {}", entry.path().display(), e),
        }
    }

    Ok(files)
}

/// Orders files largest first; ties by path for a stable order.
pub fn sort_largest_first(files: &mut [SourceFile]) {
    files.sort_by(|a, b| {
        b.size_bytes
            .cmp(&a.size_bytes)
            .then_with(|| a.path.cmp(&b.path))
    });
}
