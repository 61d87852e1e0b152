//! ffmpeg-backed [`Encoder`] and [`FrameCapture`].

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::TargetCodec;
use crate::error::ToolError;
use crate::stages::FrameCapture;
use crate::tools::process::run_status;
use crate::transcode::{EncodeParams, Encoder};

/// Video codec arguments of a target codec.
pub fn video_codec_args(codec: TargetCodec) -> &'static [&'static str] {
    match codec {
        TargetCodec::H265 => &["-c:v", "libx265", "-vtag", "hvc1"],
        TargetCodec::Av1Svt => &["-c:v", "libsvtav1", "-cpu-used", "8"],
        TargetCodec::Av1Rav => &["-c:v", "librav1e", "-cpu-used", "8"],
        TargetCodec::Av1 => &["-c:v", "libaom-av1", "-cpu-used", "8"],
        TargetCodec::Copy => &["-c:v", "copy"],
    }
}

/// Transcodes with `ffmpeg -y -v quiet -stats`.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    bin: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Build the encode command.
    ///
    /// Audio is always stream-copied. A resize scales to the target width with
    /// the height following the aspect ratio.
    pub fn build_command(&self, params: &EncodeParams) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(["-y", "-v", "quiet", "-stats"]);
        cmd.arg("-i").arg(&params.input);

        if let Some(slice) = params.slice {
            cmd.arg("-ss").arg(slice.start_secs.to_string());
            cmd.arg("-t").arg(slice.duration_secs.to_string());
        }

        if let Some(width) = params.resize_width {
            cmd.arg("-vf").arg(format!("scale={}:-1", width));
            cmd.arg("-sws_flags").arg("sinc");
        }

        cmd.args(video_codec_args(params.codec));
        cmd.args(["-c:a", "copy"]);
        cmd.arg("-crf").arg(params.crf.to_string());
        cmd.arg(&params.output);
        cmd
    }
}

impl Encoder for FfmpegEncoder {
    fn encode(&self, params: &EncodeParams) -> Result<(), ToolError> {
        run_status(&mut self.build_command(params))
    }
}

/// Grabs single frames with ffmpeg.
#[derive(Debug, Clone)]
pub struct FfmpegFrameCapture {
    bin: PathBuf,
}

impl FfmpegFrameCapture {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn build_command(&self, input: &Path, offset_secs: u64, width: u32, output: &Path) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(["-y", "-v", "quiet"]);
        // seek before -i: fast keyframe seek
        cmd.arg("-ss").arg(offset_secs.to_string());
        cmd.arg("-i").arg(input);
        cmd.args(["-vframes", "1"]);
        cmd.arg("-vf").arg(format!("scale={}:-1", width));
        cmd.arg(output);
        cmd
    }
}

impl FrameCapture for FfmpegFrameCapture {
    fn capture(&self, input: &Path, offset_secs: u64, width: u32, output: &Path) -> Result<(), ToolError> {
        run_status(&mut self.build_command(input, offset_secs, width, output))
    }
}
