//! ffprobe-backed [`AssetProbe`].

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ToolError;
use crate::probe::{AssetProbe, ProbeReport, StreamInfo};
use crate::tools::process::{run_capture_text, tool_name};

/// Raw ffprobe JSON structures for parsing.
mod ffprobe_json {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct FfprobeOutput {
        pub streams: Option<Vec<Stream>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Stream {
        pub codec_type: Option<String>,
        pub codec_name: Option<String>,
        pub width: Option<u32>,
        pub height: Option<u32>,
        pub r_frame_rate: Option<String>,
        pub bit_rate: Option<String>,
        pub duration: Option<String>,
    }
}

/// Probes files with `ffprobe -v quiet -print_format json -show_streams`.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    bin: PathBuf,
}

impl FfprobeProbe {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn build_command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(["-v", "quiet", "-print_format", "json", "-show_streams"])
            .arg(path);
        cmd
    }
}

impl AssetProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> Result<ProbeReport, ToolError> {
        let mut cmd = self.build_command(path);
        let tool = tool_name(&cmd);
        let stdout = run_capture_text(&mut cmd)?;
        parse_ffprobe_output(&stdout).map_err(|message| ToolError::Output { tool, message })
    }
}

/// Parses ffprobe JSON output into a ProbeReport.
pub fn parse_ffprobe_output(json_str: &str) -> Result<ProbeReport, String> {
    let ffprobe: ffprobe_json::FfprobeOutput =
        serde_json::from_str(json_str).map_err(|e| e.to_string())?;

    let streams = ffprobe
        .streams
        .unwrap_or_default()
        .into_iter()
        .map(|stream| StreamInfo {
            codec_type: stream.codec_type.unwrap_or_default(),
            codec_name: stream.codec_name.unwrap_or_default(),
            width: stream.width,
            height: stream.height,
            frame_rate: stream.r_frame_rate,
            bit_rate: stream.bit_rate.as_deref().and_then(|b| b.parse().ok()),
            duration_secs: stream.duration.as_deref().and_then(|d| d.parse().ok()),
        })
        .collect();

    Ok(ProbeReport { streams })
}
