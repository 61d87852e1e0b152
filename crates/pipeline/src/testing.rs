//! Deterministic fake collaborators recording every invocation.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use crate::completion::{CompletionOracle, CompletionSet};
use crate::error::ToolError;
use crate::probe::{AssetProbe, ProbeReport, StreamInfo};
use crate::stages::{FrameCapture, MetadataDumper, TorrentCreator};
use crate::transcode::{EncodeParams, Encoder};

/// Bytes a successful fake encode writes.
pub const ENCODED_BYTES: &[u8] = b"encoded";

fn failure(tool: &str) -> ToolError {
    ToolError::Failed {
        tool: tool.to_string(),
        code: 1,
        stderr: "simulated failure".to_string(),
    }
}

/// 1920x1080 at 30 fps with an aac track.
pub fn probe_report(duration_secs: u64, video_codec: &str) -> ProbeReport {
    ProbeReport {
        streams: vec![
            StreamInfo {
                codec_type: "video".to_string(),
                codec_name: video_codec.to_string(),
                width: Some(1920),
                height: Some(1080),
                frame_rate: Some("30/1".to_string()),
                bit_rate: Some(4_500_000),
                duration_secs: Some(duration_secs as f64),
            },
            StreamInfo {
                codec_type: "audio".to_string(),
                codec_name: "aac".to_string(),
                bit_rate: Some(128_000),
                duration_secs: Some(duration_secs as f64),
                ..StreamInfo::default()
            },
        ],
    }
}

/// Answers every path with the same report.
pub struct FakeProbe {
    report: ProbeReport,
    calls: Cell<usize>,
}

impl FakeProbe {
    pub fn new(report: ProbeReport) -> Self {
        Self {
            report,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl AssetProbe for FakeProbe {
    fn probe(&self, _path: &Path) -> Result<ProbeReport, ToolError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.report.clone())
    }
}

/// Writes a placeholder image at the requested output.
#[derive(Default)]
pub struct FakeFrameCapture {
    offsets: RefCell<Vec<u64>>,
}

impl FakeFrameCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offsets(&self) -> Vec<u64> {
        self.offsets.borrow().clone()
    }
}

impl FrameCapture for FakeFrameCapture {
    fn capture(&self, _input: &Path, offset_secs: u64, _width: u32, output: &Path) -> Result<(), ToolError> {
        self.offsets.borrow_mut().push(offset_secs);
        fs::write(output, format!("frame at {}", offset_secs)).map_err(|source| ToolError::Spawn {
            tool: "fake-capture".to_string(),
            source,
        })
    }
}

pub struct FakeDumper {
    text: String,
    calls: Cell<usize>,
}

impl FakeDumper {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl MetadataDumper for FakeDumper {
    fn dump(&self, _input: &Path) -> Result<String, ToolError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.text.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentCall {
    pub input: PathBuf,
    pub announce_url: String,
    pub private: bool,
    pub output: PathBuf,
}

/// Writes a descriptor, or a partial one followed by a failure.
#[derive(Default)]
pub struct FakeTorrentCreator {
    fail: bool,
    calls: RefCell<Vec<TorrentCall>>,
}

impl FakeTorrentCreator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<TorrentCall> {
        self.calls.borrow().clone()
    }
}

impl TorrentCreator for FakeTorrentCreator {
    fn create(&self, input: &Path, announce_url: &str, private: bool, output: &Path) -> Result<(), ToolError> {
        self.calls.borrow_mut().push(TorrentCall {
            input: input.to_path_buf(),
            announce_url: announce_url.to_string(),
            private,
            output: output.to_path_buf(),
        });
        let contents: &[u8] = if self.fail { b"partial" } else { b"d8:announce" };
        fs::write(output, contents).map_err(|source| ToolError::Spawn {
            tool: "fake-create".to_string(),
            source,
        })?;
        if self.fail {
            return Err(failure("transmission-create"));
        }
        Ok(())
    }
}

/// Writes [`ENCODED_BYTES`], or a partial output followed by a failure.
#[derive(Default)]
pub struct FakeEncoder {
    fail: bool,
    calls: RefCell<Vec<EncodeParams>>,
}

impl FakeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<EncodeParams> {
        self.calls.borrow().clone()
    }
}

impl Encoder for FakeEncoder {
    fn encode(&self, params: &EncodeParams) -> Result<(), ToolError> {
        self.calls.borrow_mut().push(params.clone());
        let contents = if self.fail { &b"partial"[..] } else { ENCODED_BYTES };
        fs::write(&params.output, contents).map_err(|source| ToolError::Spawn {
            tool: "fake-encoder".to_string(),
            source,
        })?;
        if self.fail {
            return Err(failure("ffmpeg"));
        }
        Ok(())
    }
}

/// Completion source with a fixed answer, or unreachable.
pub struct FakeOracle {
    keys: Option<CompletionSet>,
    calls: Cell<usize>,
}

impl FakeOracle {
    pub fn new<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            keys: Some(keys.into_iter().collect()),
            calls: Cell::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            keys: None,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl CompletionOracle for FakeOracle {
    fn completed(&self) -> Result<CompletionSet, ToolError> {
        self.calls.set(self.calls.get() + 1);
        self.keys
            .clone()
            .ok_or_else(|| failure("transmission-remote"))
    }
}
