//! Probed assets of the publish pipeline.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;
use crate::naming::{self, DecodedName};
use crate::probe::{AssetProbe, ProbeReport, StreamKind};

/// Technical metadata of an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    /// Rounded to whole seconds.
    pub duration_secs: u64,
    pub width: u32,
    pub height: u32,
    /// Rounded to whole frames per second.
    pub fps: u32,
    pub video_codec: String,
    pub video_bps: u64,
    pub audio_codec: String,
    pub audio_bps: u64,
    pub file_size: u64,
}

impl VideoMetadata {
    /// Builds metadata from the first video and first audio stream of `report`.
    pub fn from_probe(path: &Path, report: &ProbeReport, file_size: u64) -> Result<Self, PipelineError> {
        let video = report.require_stream(path, StreamKind::Video)?;
        let audio = report.require_stream(path, StreamKind::Audio)?;

        Ok(Self {
            duration_secs: video.duration_secs.unwrap_or(0.0).max(0.0).round() as u64,
            width: video.width.unwrap_or(0),
            height: video.height.unwrap_or(0),
            fps: video.rounded_fps(),
            video_codec: video.codec_name.clone(),
            video_bps: video.bit_rate.unwrap_or(0),
            audio_codec: audio.codec_name.clone(),
            audio_bps: audio.bit_rate.unwrap_or(0),
            file_size,
        })
    }
}

/// A source video with its decoded name and probed metadata.
///
/// Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: PathBuf,
    /// File stem; names the scratch directory and the completion entry.
    pub key: String,
    pub title: String,
    pub contributors: Vec<String>,
    pub meta: VideoMetadata,
}

impl Asset {
    /// Decodes the file name, then probes the file.
    ///
    /// The name is checked first so a malformed name never costs a probe.
    pub fn load(
        path: &Path,
        probe: &dyn AssetProbe,
        typos: &BTreeMap<String, String>,
    ) -> Result<Self, PipelineError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let DecodedName { title, contributors } =
            naming::decode(&file_name, typos).map_err(|source| PipelineError::MalformedName {
                path: path.to_path_buf(),
                source,
            })?;

        let report = probe
            .probe(path)
            .map_err(|source| PipelineError::tool(path, source))?;
        let file_size = fs::metadata(path)
            .map_err(|source| PipelineError::io(path, source))?
            .len();
        let meta = VideoMetadata::from_probe(path, &report, file_size)?;

        Ok(Self {
            path: path.to_path_buf(),
            key: asset_key(path),
            title,
            contributors,
            meta,
        })
    }
}

/// Stable key of an asset: its file stem.
pub fn asset_key(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
