//! mediainfo-backed [`MetadataDumper`].

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ToolError;
use crate::stages::MetadataDumper;
use crate::tools::process::run_capture_text;

#[derive(Debug, Clone)]
pub struct MediaInfoDumper {
    bin: PathBuf,
}

impl MediaInfoDumper {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    pub fn build_command(&self, input: &Path) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg(input);
        cmd
    }
}

impl MetadataDumper for MediaInfoDumper {
    fn dump(&self, input: &Path) -> Result<String, ToolError> {
        run_capture_text(&mut self.build_command(input))
    }
}
