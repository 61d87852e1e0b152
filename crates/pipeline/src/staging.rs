//! Staging module for atomic promotion of finished artifacts.
//!
//! Every artifact is produced under a staging name next to its final path
//! and renamed into place only once it is complete. An interrupted run can
//! leave a staging file behind, never a partial file under the final name.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Staging path that keeps the container extension: `<stem>.tmp.<ext>`.
///
/// Encoders pick the output format from the extension, so media staging
/// files must keep it.
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use vidpub::staging::media_staging_path;
///
/// let staging = media_staging_path(Path::new("/v/Title_1920x1080_30fps_h265_crf18.mp4"));
/// assert_eq!(staging, PathBuf::from("/v/Title_1920x1080_30fps_h265_crf18.tmp.mp4"));
/// ```
pub fn media_staging_path(target: &Path) -> PathBuf {
    match target.extension() {
        Some(ext) => {
            let mut ext_with_tmp = std::ffi::OsString::from("tmp.");
            ext_with_tmp.push(ext);
            target.with_extension(ext_with_tmp)
        }
        None => target.with_extension("tmp"),
    }
}

/// Staging path replacing the extension with `.tmp`: `<stem>.tmp`.
pub fn replaced_staging_path(target: &Path) -> PathBuf {
    target.with_extension("tmp")
}

/// Renames a finished staging file onto its final name.
pub fn promote(staging: &Path, target: &Path) -> io::Result<()> {
    fs::rename(staging, target)
}

/// Writes `contents` to `target` through `<stem>.tmp.<ext>`.
///
/// `<stem>.tmp` stays free for tools that stage next to the same stem.
pub fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    let staging = media_staging_path(target);
    fs::write(&staging, contents)?;
    promote(&staging, target)
}

/// Moves a file, copying across file systems when a rename is refused.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

/// Appends one line to a file, creating it when missing.
pub fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}
