//! Error taxonomy shared by the publish and compress pipelines.
//!
//! Every variant of [`PipelineError`] is fatal for the asset being processed
//! and carries the offending path. Nothing is retried: a re-run picks up at the
//! first unsatisfied existence check.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::naming::NamingError;
use crate::probe::StreamKind;

/// Failure of an external tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started at all.
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The process exited with a non-zero status.
    #[error("{tool} failed with exit code {code}{}", format_stderr(.stderr))]
    Failed {
        tool: String,
        code: i32,
        stderr: String,
    },

    /// The process was terminated by a signal.
    #[error("{tool} was terminated by signal")]
    Terminated { tool: String },

    /// The process succeeded but its output could not be used.
    #[error("{tool} produced unusable output: {message}")]
    Output { tool: String, message: String },
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Fatal per-asset pipeline error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The file name does not follow the naming convention.
    #[error("malformed name {}: {source}", .path.display())]
    MalformedName {
        path: PathBuf,
        #[source]
        source: NamingError,
    },

    /// The probe result lacks a required stream.
    #[error("{} has no {kind} stream", .path.display())]
    MissingStream { path: PathBuf, kind: StreamKind },

    /// An external tool exited non-zero or could not run.
    #[error("external tool failed on {}: {source}", .path.display())]
    ExternalToolFailure {
        path: PathBuf,
        #[source]
        source: ToolError,
    },

    /// Two originals map to the same transcode target.
    #[error("{} and {} both transcode to {}", .first.display(), .second.display(), .target.display())]
    TargetCollision {
        target: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    /// The completion source could not be queried.
    #[error("completion source unavailable: {0}")]
    CompletionUnavailable(#[source] ToolError),

    /// File-system operation failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn tool(path: impl Into<PathBuf>, source: ToolError) -> Self {
        PipelineError::ExternalToolFailure {
            path: path.into(),
            source,
        }
    }

    /// Path the error is about, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            PipelineError::MalformedName { path, .. }
            | PipelineError::MissingStream { path, .. }
            | PipelineError::ExternalToolFailure { path, .. }
            | PipelineError::Io { path, .. } => Some(path),
            PipelineError::TargetCollision { target, .. } => Some(target),
            PipelineError::CompletionUnavailable(_) => None,
        }
    }
}
