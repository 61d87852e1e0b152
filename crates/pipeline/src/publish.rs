//! Publish pipeline: one pass over the input directory.
//!
//! The completion source is queried once, the janitor reconciles the scratch
//! workspace against it, then every remaining candidate runs through the
//! stages in file-name order. The first per-asset error aborts the run.

use log::{debug, info};
use std::collections::BTreeMap;

use crate::asset::{asset_key, Asset};
use crate::completion::CompletionOracle;
use crate::config::PublishConfig;
use crate::error::PipelineError;
use crate::janitor::WorkspaceJanitor;
use crate::probe::AssetProbe;
use crate::scan::{is_publish_candidate, is_staging_file, list_media_files};
use crate::stages::{AssetWorkspace, FrameCapture, MetadataDumper, StageRunner, TorrentCreator};

/// External collaborators of the publish pipeline.
#[derive(Clone, Copy)]
pub struct PublishTools<'a> {
    pub probe: &'a dyn AssetProbe,
    pub oracle: &'a dyn CompletionOracle,
    pub frames: &'a dyn FrameCapture,
    pub dumper: &'a dyn MetadataDumper,
    pub torrents: &'a dyn TorrentCreator,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishSummary {
    /// Scratch directories removed by the janitor.
    pub cleaned: usize,
    pub skipped_completed: usize,
    pub skipped_staging: usize,
    /// Assets that went through the stage runner.
    pub processed: usize,
    /// Assets where at least one stage did work.
    pub advanced: usize,
}

pub struct PublishPipeline<'a> {
    settings: &'a PublishConfig,
    typos: &'a BTreeMap<String, String>,
    tools: PublishTools<'a>,
}

impl<'a> PublishPipeline<'a> {
    pub fn new(
        settings: &'a PublishConfig,
        typos: &'a BTreeMap<String, String>,
        tools: PublishTools<'a>,
    ) -> Self {
        Self {
            settings,
            typos,
            tools,
        }
    }

    pub fn run(&self) -> Result<PublishSummary, PipelineError> {
        let completion = self
            .tools
            .oracle
            .completed()
            .map_err(PipelineError::CompletionUnavailable)?;
        info!("{} assets complete at the completion source", completion.len());

        let cleaned = WorkspaceJanitor::new(&self.settings.scratch_dir).run(&completion)?;
        let mut summary = PublishSummary {
            cleaned: cleaned.len(),
            ..PublishSummary::default()
        };

        let runner = StageRunner::new(
            self.settings,
            self.tools.frames,
            self.tools.dumper,
            self.tools.torrents,
        );

        let candidates = list_media_files(&self.settings.input_dir)?;
        for file in candidates.iter().filter(|f| is_publish_candidate(&f.path)) {
            if is_staging_file(&file.path) {
                debug!("Skip temp {}", file.path.display());
                summary.skipped_staging += 1;
                continue;
            }
            if completion.contains(&asset_key(&file.path)) {
                debug!("Skip completed {}", file.path.display());
                summary.skipped_completed += 1;
                continue;
            }

            info!("[file] {}", file.path.display());
            let asset = Asset::load(&file.path, self.tools.probe, self.typos)?;
            let ws = AssetWorkspace::open(&self.settings.scratch_dir, &asset.key)?;
            let report = runner.run(&asset, &ws)?;

            summary.processed += 1;
            if report.ran_any() {
                summary.advanced += 1;
            }
        }

        info!(
            "Publish done: {} processed, {} advanced, {} already complete, {} cleaned",
            summary.processed, summary.advanced, summary.skipped_completed, summary.cleaned
        );
        Ok(summary)
    }
}
