//! Transmission command line tools: descriptor creation and the remote
//! listing used as completion source.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::completion::{CompletionOracle, CompletionSet};
use crate::config::CompletionConfig;
use crate::error::ToolError;
use crate::stages::TorrentCreator;
use crate::tools::process::{run_capture_text, run_status};

/// `transmission-create [--private] -t <announce> -o <out> <in>`
#[derive(Debug, Clone)]
pub struct TransmissionCreate {
    bin: PathBuf,
}

impl TransmissionCreate {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn build_command(&self, input: &Path, announce_url: &str, private: bool, output: &Path) -> Command {
        let mut cmd = Command::new(&self.bin);
        if private {
            cmd.arg("--private");
        }
        cmd.arg("-t").arg(announce_url);
        cmd.arg("-o").arg(output);
        cmd.arg(input);
        cmd
    }
}

impl TorrentCreator for TransmissionCreate {
    fn create(&self, input: &Path, announce_url: &str, private: bool, output: &Path) -> Result<(), ToolError> {
        run_status(&mut self.build_command(input, announce_url, private, output))
    }
}

/// `transmission-remote [host] -n <auth> -l`
#[derive(Debug, Clone)]
pub struct TransmissionRemote {
    bin: PathBuf,
    settings: CompletionConfig,
}

impl TransmissionRemote {
    pub fn new(bin: impl Into<PathBuf>, settings: CompletionConfig) -> Self {
        Self {
            bin: bin.into(),
            settings,
        }
    }

    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.bin);
        if let Some(host) = &self.settings.host {
            cmd.arg(host);
        }
        if let Some(auth) = &self.settings.auth {
            cmd.arg("-n").arg(auth);
        }
        cmd.arg("-l");
        cmd
    }
}

impl CompletionOracle for TransmissionRemote {
    fn completed(&self) -> Result<CompletionSet, ToolError> {
        let listing = run_capture_text(&mut self.build_command())?;
        Ok(CompletionSet::parse_listing(&listing))
    }
}
