//! Blocking process execution shared by the tool wrappers.

use log::debug;
use std::path::Path;
use std::process::{Command, ExitStatus};

use crate::error::ToolError;

/// Short tool name for messages: the program's file name.
pub fn tool_name(cmd: &Command) -> String {
    Path::new(cmd.get_program())
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cmd.get_program().to_string_lossy().into_owned())
}

fn check_status(tool: String, status: ExitStatus, stderr: &[u8]) -> Result<(), ToolError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(ToolError::Failed {
            tool,
            code,
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }),
        None => Err(ToolError::Terminated { tool }),
    }
}

/// Run a command with inherited stdio and wait for it.
pub fn run_status(cmd: &mut Command) -> Result<(), ToolError> {
    let tool = tool_name(cmd);
    debug!("[run] {:?}", cmd);
    let status = cmd.status().map_err(|source| ToolError::Spawn {
        tool: tool.clone(),
        source,
    })?;
    check_status(tool, status, &[])
}

/// Run a command, wait for it and return its stdout.
pub fn run_capture(cmd: &mut Command) -> Result<Vec<u8>, ToolError> {
    let tool = tool_name(cmd);
    debug!("[run] {:?}", cmd);
    let output = cmd.output().map_err(|source| ToolError::Spawn {
        tool: tool.clone(),
        source,
    })?;
    check_status(tool, output.status, &output.stderr)?;
    Ok(output.stdout)
}

/// Like [`run_capture`], decoding stdout as UTF-8.
pub fn run_capture_text(cmd: &mut Command) -> Result<String, ToolError> {
    let tool = tool_name(cmd);
    let stdout = run_capture(cmd)?;
    String::from_utf8(stdout).map_err(|e| ToolError::Output {
        tool,
        message: format!("stdout is not valid UTF-8: {}", e),
    })
}
