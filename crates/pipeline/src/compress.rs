//! Compress pipeline: select every candidate, then transcode and archive.

use log::info;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::archive::{format_gib, ArchiveMover};
use crate::config::TranscodeConfig;
use crate::error::PipelineError;
use crate::probe::AssetProbe;
use crate::selector::{Selection, TranscodeSelector};
use crate::transcode::{target_path, Encoder, TranscodeExecutor, TranscodeJob, TranscodeOutcome};

/// External collaborators of the compress pipeline.
#[derive(Clone, Copy)]
pub struct CompressTools<'a> {
    pub probe: &'a dyn AssetProbe,
    pub encoder: &'a dyn Encoder,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressSummary {
    pub candidates: usize,
    pub skipped: usize,
    pub encoded: usize,
    /// Targets found on disk from an earlier, interrupted run.
    pub already_present: usize,
    pub archived: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

pub struct CompressPipeline<'a> {
    settings: &'a TranscodeConfig,
    tools: CompressTools<'a>,
}

impl<'a> CompressPipeline<'a> {
    pub fn new(settings: &'a TranscodeConfig, tools: CompressTools<'a>) -> Self {
        Self { settings, tools }
    }

    /// Evaluates every candidate largest first, then transcodes and archives
    /// the selected ones. Two selected sources sharing a target abort the run
    /// before anything is encoded. The first error aborts the run.
    pub fn run(&self) -> Result<CompressSummary, PipelineError> {
        let selector = TranscodeSelector::new(self.settings, self.tools.probe);
        let executor = TranscodeExecutor::new(self.tools.encoder);
        let archiver = ArchiveMover::new(self.settings);

        let files = selector.candidates()?;
        let mut summary = CompressSummary {
            candidates: files.len(),
            ..CompressSummary::default()
        };

        let mut selected = Vec::new();
        let mut targets: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
        for (index, file) in files.iter().enumerate() {
            info!(
                "[{}/{}] {} is {} GiB",
                index + 1,
                files.len(),
                file.path.display(),
                format_gib(file.size_bytes)
            );

            let source = match selector.evaluate(file)? {
                Selection::Selected(source) => source,
                Selection::Skipped(reason) => {
                    info!("  -  Skipping: {}", reason);
                    summary.skipped += 1;
                    continue;
                }
            };
            info!(
                "  -  Content probe: {}x{} {}",
                source.geometry.width, source.geometry.height, source.codec_name
            );

            let job = TranscodeJob::for_source(self.settings, &source.geometry);
            let target = target_path(&file.path, &job, &source.geometry);
            if let Some(first) = targets.insert(target.clone(), file.path.clone()) {
                return Err(PipelineError::TargetCollision {
                    target,
                    first,
                    second: file.path.clone(),
                });
            }
            selected.push((source, job));
        }

        for (source, job) in &selected {
            let path = &source.file.path;
            let outcome = executor.execute(path, job, &source.geometry)?;
            match outcome {
                TranscodeOutcome::Encoded { .. } => summary.encoded += 1,
                TranscodeOutcome::AlreadyPresent { .. } => {
                    info!("  -  Target exists: {}", outcome.target().display());
                    summary.already_present += 1;
                }
            }

            let record = archiver.archive(path, outcome.target())?;
            summary.archived += 1;
            summary.bytes_before += record.before_bytes;
            summary.bytes_after += record.after_bytes;
        }

        info!(
            "Compress done: {} encoded, {} resumed, {} skipped, {} GiB -> {} GiB",
            summary.encoded,
            summary.already_present,
            summary.skipped,
            format_gib(summary.bytes_before),
            format_gib(summary.bytes_after)
        );
        Ok(summary)
    }
}
