//! Derived-artifact stages of the publish pipeline.
//!
//! Every stage owns one named completion predicate over the asset's
//! workspace directory. A stage whose predicate holds does nothing; otherwise
//! its collaborator runs and the artifact is promoted into place. Artifact
//! existence is the only record of progress.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::asset::Asset;
use crate::config::PublishConfig;
use crate::error::{PipelineError, ToolError};
use crate::staging::{media_staging_path, promote, replaced_staging_path, write_atomic};
use crate::template::{render_description, render_title};

/// Captures one scaled frame of a video.
pub trait FrameCapture {
    fn capture(&self, input: &Path, offset_secs: u64, width: u32, output: &Path) -> Result<(), ToolError>;
}

/// Produces the human-readable technical report of a video.
pub trait MetadataDumper {
    fn dump(&self, input: &Path) -> Result<String, ToolError>;
}

/// Writes a torrent descriptor for a file.
pub trait TorrentCreator {
    fn create(&self, input: &Path, announce_url: &str, private: bool, output: &Path) -> Result<(), ToolError>;
}

/// Stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Thumbnails,
    MetadataDump,
    Description,
    TorrentDescriptor,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Thumbnails,
        Stage::MetadataDump,
        Stage::Description,
        Stage::TorrentDescriptor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Thumbnails => "thumbnails",
            Stage::MetadataDump => "metadata",
            Stage::Description => "description",
            Stage::TorrentDescriptor => "torrent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The completion predicate already held.
    Skipped,
    Ran,
}

/// Scratch directory of one asset and the artifact paths inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetWorkspace {
    dir: PathBuf,
    key: String,
}

impl AssetWorkspace {
    pub fn new(scratch_root: &Path, key: &str) -> Self {
        Self {
            dir: scratch_root.join(key),
            key: key.to_string(),
        }
    }

    /// Like [`AssetWorkspace::new`], creating the directory when missing.
    pub fn open(scratch_root: &Path, key: &str) -> Result<Self, PipelineError> {
        let ws = Self::new(scratch_root, key);
        fs::create_dir_all(&ws.dir).map_err(|e| PipelineError::io(&ws.dir, e))?;
        Ok(ws)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Frame `index` is 1-based.
    pub fn capture_path(&self, index: u32) -> PathBuf {
        self.dir.join(format!("capture_{}.jpg", index))
    }

    pub fn nfo_path(&self) -> PathBuf {
        self.dir.join(format!("{}.nfo", self.key))
    }

    pub fn description_path(&self) -> PathBuf {
        self.dir.join("description.txt")
    }

    pub fn title_path(&self) -> PathBuf {
        self.dir.join("title.txt")
    }

    pub fn torrent_path(&self) -> PathBuf {
        self.dir.join(format!("{}.torrent", self.key))
    }

    /// `<key>.tmp`, where the creator writes before promotion.
    pub fn torrent_staging_path(&self) -> PathBuf {
        replaced_staging_path(&self.torrent_path())
    }
}

/// Frames to take from a video of `duration_secs`: `(index, offset)` pairs.
///
/// Offsets are `interval * index` for `index` in `1..=count`; offsets at or
/// past the end of the video, or beyond `u64`, are dropped.
pub fn capture_offsets(duration_secs: u64, settings: &PublishConfig) -> Vec<(u32, u64)> {
    (1..=settings.thumbnail_count)
        .map_while(|index| {
            let offset = settings.thumbnail_interval_secs.checked_mul(u64::from(index))?;
            Some((index, offset))
        })
        .take_while(|&(_, offset)| offset < duration_secs)
        .collect()
}

/// Frames whose file is still missing.
pub fn pending_captures(ws: &AssetWorkspace, duration_secs: u64, settings: &PublishConfig) -> Vec<(u32, u64)> {
    capture_offsets(duration_secs, settings)
        .into_iter()
        .filter(|&(index, _)| !ws.capture_path(index).exists())
        .collect()
}

pub fn thumbnails_complete(ws: &AssetWorkspace, duration_secs: u64, settings: &PublishConfig) -> bool {
    pending_captures(ws, duration_secs, settings).is_empty()
}

pub fn metadata_dump_complete(ws: &AssetWorkspace) -> bool {
    ws.nfo_path().exists()
}

pub fn description_complete(ws: &AssetWorkspace) -> bool {
    ws.description_path().exists() && ws.title_path().exists()
}

pub fn torrent_complete(ws: &AssetWorkspace) -> bool {
    ws.torrent_path().exists()
}

/// Drops every line starting with `prefix`.
pub fn strip_encoder_settings(text: &str, prefix: &str) -> String {
    text.split('\n')
        .filter(|line| !line.starts_with(prefix))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Outcome of every stage for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub outcomes: Vec<(Stage, StageOutcome)>,
    /// Frames captured by this run.
    pub captures_written: usize,
}

impl StageReport {
    pub fn outcome(&self, stage: Stage) -> Option<StageOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, outcome)| *outcome)
    }

    pub fn ran_any(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| *o == StageOutcome::Ran)
    }
}

/// Runs the stages of one asset in order.
pub struct StageRunner<'a> {
    settings: &'a PublishConfig,
    frames: &'a dyn FrameCapture,
    dumper: &'a dyn MetadataDumper,
    torrents: &'a dyn TorrentCreator,
}

impl<'a> StageRunner<'a> {
    pub fn new(
        settings: &'a PublishConfig,
        frames: &'a dyn FrameCapture,
        dumper: &'a dyn MetadataDumper,
        torrents: &'a dyn TorrentCreator,
    ) -> Self {
        Self {
            settings,
            frames,
            dumper,
            torrents,
        }
    }

    /// Runs every stage; the first failure aborts the remaining ones.
    pub fn run(&self, asset: &Asset, ws: &AssetWorkspace) -> Result<StageReport, PipelineError> {
        let mut report = StageReport {
            outcomes: Vec::with_capacity(Stage::ALL.len()),
            captures_written: 0,
        };

        for stage in Stage::ALL {
            let outcome = match stage {
                Stage::Thumbnails => {
                    let written = self.thumbnails(asset, ws)?;
                    report.captures_written = written;
                    if written == 0 {
                        StageOutcome::Skipped
                    } else {
                        StageOutcome::Ran
                    }
                }
                Stage::MetadataDump => self.metadata_dump(asset, ws)?,
                Stage::Description => self.description(asset, ws)?,
                Stage::TorrentDescriptor => self.torrent(asset, ws)?,
            };
            match outcome {
                StageOutcome::Skipped => debug!("[{}] {} already done", asset.key, stage.as_str()),
                StageOutcome::Ran => info!("[{}] {} written", asset.key, stage.as_str()),
            }
            report.outcomes.push((stage, outcome));
        }

        Ok(report)
    }

    fn thumbnails(&self, asset: &Asset, ws: &AssetWorkspace) -> Result<usize, PipelineError> {
        let pending = pending_captures(ws, asset.meta.duration_secs, self.settings);
        for &(index, offset) in &pending {
            let target = ws.capture_path(index);
            let staging = media_staging_path(&target);
            debug!("[{}] capture {} at {}s", asset.key, index, offset);
            self.frames
                .capture(&asset.path, offset, self.settings.thumbnail_width, &staging)
                .map_err(|e| PipelineError::tool(&asset.path, e))?;
            promote(&staging, &target).map_err(|e| PipelineError::io(&target, e))?;
        }
        Ok(pending.len())
    }

    fn metadata_dump(&self, asset: &Asset, ws: &AssetWorkspace) -> Result<StageOutcome, PipelineError> {
        if metadata_dump_complete(ws) {
            return Ok(StageOutcome::Skipped);
        }
        let text = self
            .dumper
            .dump(&asset.path)
            .map_err(|e| PipelineError::tool(&asset.path, e))?;
        let stripped = strip_encoder_settings(&text, &self.settings.metadata_strip_prefix);
        let nfo = ws.nfo_path();
        write_atomic(&nfo, stripped.as_bytes()).map_err(|e| PipelineError::io(&nfo, e))?;
        Ok(StageOutcome::Ran)
    }

    fn description(&self, asset: &Asset, ws: &AssetWorkspace) -> Result<StageOutcome, PipelineError> {
        if description_complete(ws) {
            return Ok(StageOutcome::Skipped);
        }
        let description = ws.description_path();
        if !description.exists() {
            write_atomic(&description, render_description(asset).as_bytes())
                .map_err(|e| PipelineError::io(&description, e))?;
        }
        let title = ws.title_path();
        if !title.exists() {
            write_atomic(&title, render_title(asset, self.settings).as_bytes())
                .map_err(|e| PipelineError::io(&title, e))?;
        }
        Ok(StageOutcome::Ran)
    }

    fn torrent(&self, asset: &Asset, ws: &AssetWorkspace) -> Result<StageOutcome, PipelineError> {
        if torrent_complete(ws) {
            return Ok(StageOutcome::Skipped);
        }
        let staging = ws.torrent_staging_path();
        // the creator refuses to overwrite a leftover from an interrupted run
        if staging.exists() {
            fs::remove_file(&staging).map_err(|e| PipelineError::io(&staging, e))?;
        }
        self.torrents
            .create(
                &asset.path,
                &self.settings.announce_url,
                self.settings.private,
                &staging,
            )
            .map_err(|e| PipelineError::tool(&asset.path, e))?;
        let target = ws.torrent_path();
        promote(&staging, &target).map_err(|e| PipelineError::io(&target, e))?;
        Ok(StageOutcome::Ran)
    }
}
