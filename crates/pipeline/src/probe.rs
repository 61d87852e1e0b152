//! Asset probing contract.
//!
//! The probe tool itself lives in [`crate::tools::ffprobe`]; pipeline
//! components only see the [`AssetProbe`] trait and the stream records it
//! returns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{PipelineError, ToolError};

/// Stream type a caller can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stream of a probed file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// `video`, `audio`, `subtitle`, ...
    pub codec_type: String,
    pub codec_name: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Frame rate as a ratio string, e.g. `30000/1001`.
    pub frame_rate: Option<String>,
    /// Bits per second.
    pub bit_rate: Option<u64>,
    pub duration_secs: Option<f64>,
}

impl StreamInfo {
    pub fn is(&self, kind: StreamKind) -> bool {
        self.codec_type == kind.as_str()
    }

    /// Frame rate rounded to whole frames per second, 0 when unknown.
    pub fn rounded_fps(&self) -> u32 {
        self.frame_rate
            .as_deref()
            .and_then(parse_frame_rate)
            .map(|fps| fps.round() as u32)
            .unwrap_or(0)
    }
}

/// Result of probing one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub streams: Vec<StreamInfo>,
}

impl ProbeReport {
    /// First stream of the given type.
    pub fn first_stream(&self, kind: StreamKind) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.is(kind))
    }

    /// First stream of the given type, or `MissingStream` naming `path`.
    pub fn require_stream(
        &self,
        path: &Path,
        kind: StreamKind,
    ) -> Result<&StreamInfo, PipelineError> {
        self.first_stream(kind)
            .ok_or_else(|| PipelineError::MissingStream {
                path: path.to_path_buf(),
                kind,
            })
    }
}

/// Picture size and rate of a video stream, as written into file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Geometry {
    pub fn from_stream(stream: &StreamInfo) -> Self {
        Self {
            width: stream.width.unwrap_or(0),
            height: stream.height.unwrap_or(0),
            fps: stream.rounded_fps(),
        }
    }
}

/// Collaborator returning technical metadata for one file.
pub trait AssetProbe {
    fn probe(&self, path: &Path) -> Result<ProbeReport, ToolError>;
}

/// Parses a `num/den` frame-rate ratio; a plain number is accepted too.
///
/// Returns `None` for a zero denominator or unparseable input.
pub fn parse_frame_rate(ratio: &str) -> Option<f64> {
    match ratio.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                None
            } else {
                Some(num / den)
            }
        }
        None => ratio.trim().parse().ok(),
    }
}
