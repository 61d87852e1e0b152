//! Archiving of transcoded originals.

use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::TranscodeConfig;
use crate::error::PipelineError;
use crate::staging::{append_line, move_file};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Size in GiB with two decimals.
pub fn format_gib(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_GIB)
}

/// What archiving one original produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    /// Where the original now lives.
    pub original: PathBuf,
    pub target: PathBuf,
    pub launcher: PathBuf,
    pub before_bytes: u64,
    pub after_bytes: u64,
}

impl ArchiveRecord {
    /// `<target> <before> GiB -> <after> GiB`
    pub fn report_line(&self) -> String {
        format!(
            "{} {} GiB -> {} GiB",
            self.target.display(),
            format_gib(self.before_bytes),
            format_gib(self.after_bytes)
        )
    }
}

/// Moves originals aside once their target exists.
pub struct ArchiveMover<'a> {
    settings: &'a TranscodeConfig,
}

impl<'a> ArchiveMover<'a> {
    pub fn new(settings: &'a TranscodeConfig) -> Self {
        Self { settings }
    }

    /// Archive directory next to `source`.
    pub fn archive_dir(&self, source: &Path) -> PathBuf {
        source
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(&self.settings.archive_dir_name)
    }

    fn launcher_command(&self, original: &Path, target: &Path) -> String {
        format!(
            "{} \"{}\" \"{}\"\n",
            self.settings.compare_player,
            original.display(),
            target.display()
        )
    }

    /// Archived original whose launcher already compares against `target`.
    pub fn claimant(&self, source: &Path, target: &Path) -> Option<PathBuf> {
        let archive_dir = self.archive_dir(source);
        if !archive_dir.is_dir() {
            return None;
        }
        let head = format!("{} \"", self.settings.compare_player);
        let tail = format!("\" \"{}\"", target.display());

        let walker = WalkDir::new(&archive_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error reading directory entry in {}: {}", archive_dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            let is_launcher = entry.file_type().is_file()
                && path.extension().and_then(|e| e.to_str())
                    == Some(self.settings.launcher_extension.as_str());
            if !is_launcher {
                continue;
            }
            let contents = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Cannot read launcher {}: {}", path.display(), e);
                    continue;
                }
            };
            let original = contents
                .trim_end()
                .strip_prefix(head.as_str())
                .and_then(|rest| rest.strip_suffix(tail.as_str()));
            if let Some(original) = original {
                return Some(PathBuf::from(original));
            }
        }
        None
    }

    /// Moves `source` into the archive directory, writes its comparison
    /// launcher and appends the size report line.
    ///
    /// Not existence-checked: a moved original is no longer a candidate. A
    /// target already claimed by another archived original is a
    /// [`PipelineError::TargetCollision`] and nothing is moved.
    pub fn archive(&self, source: &Path, target: &Path) -> Result<ArchiveRecord, PipelineError> {
        let archive_dir = self.archive_dir(source);
        let original = match source.file_name() {
            Some(name) => archive_dir.join(name),
            None => return Err(PipelineError::io(source, std::io::ErrorKind::InvalidInput.into())),
        };
        if let Some(first) = self.claimant(source, target).filter(|first| *first != original) {
            return Err(PipelineError::TargetCollision {
                target: target.to_path_buf(),
                first,
                second: source.to_path_buf(),
            });
        }

        let before_bytes = fs::metadata(source)
            .map_err(|e| PipelineError::io(source, e))?
            .len();
        let after_bytes = fs::metadata(target)
            .map_err(|e| PipelineError::io(target, e))?
            .len();

        fs::create_dir_all(&archive_dir).map_err(|e| PipelineError::io(&archive_dir, e))?;
        move_file(source, &original).map_err(|e| PipelineError::io(&original, e))?;

        let launcher = original.with_extension(&self.settings.launcher_extension);
        fs::write(&launcher, self.launcher_command(&original, target))
            .map_err(|e| PipelineError::io(&launcher, e))?;

        let record = ArchiveRecord {
            original,
            target: target.to_path_buf(),
            launcher,
            before_bytes,
            after_bytes,
        };
        let report = archive_dir.join(&self.settings.report_file);
        append_line(&report, &record.report_line()).map_err(|e| PipelineError::io(&report, e))?;

        info!("{}", record.report_line());
        Ok(record)
    }
}
