//! Transcode jobs and their staged execution.

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::config::{SliceConfig, TargetCodec, TranscodeConfig};
use crate::error::{PipelineError, ToolError};
use crate::naming::target_file_name;
use crate::probe::Geometry;
use crate::staging::{media_staging_path, promote};

/// Output picture size of a downscale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
}

/// Everything that determines a transcode's output and its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscodeJob {
    pub codec: TargetCodec,
    pub crf: u8,
    pub resize: Option<Resize>,
    pub slice: Option<SliceConfig>,
}

impl TranscodeJob {
    /// Job for a source of the given geometry.
    ///
    /// A resize applies only when the source is wider than `max_width`; the
    /// height keeps the aspect ratio, rounded to the nearest pixel.
    pub fn for_source(settings: &TranscodeConfig, geometry: &Geometry) -> Self {
        let resize = settings
            .max_width
            .filter(|&max| geometry.width > max)
            .map(|max| Resize {
                width: max,
                height: (f64::from(geometry.height) * f64::from(max) / f64::from(geometry.width)).round()
                    as u32,
            });
        Self {
            codec: settings.codec,
            crf: settings.crf,
            resize,
            slice: settings.slice,
        }
    }
}

/// Arguments of one encoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeParams {
    pub input: PathBuf,
    pub output: PathBuf,
    pub codec: TargetCodec,
    pub crf: u8,
    /// Target width; height follows the aspect ratio.
    pub resize_width: Option<u32>,
    pub slice: Option<SliceConfig>,
}

/// Video encoding engine.
pub trait Encoder {
    fn encode(&self, params: &EncodeParams) -> Result<(), ToolError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOutcome {
    Encoded { target: PathBuf },
    /// The target was already on disk; nothing was encoded.
    AlreadyPresent { target: PathBuf },
}

impl TranscodeOutcome {
    pub fn target(&self) -> &Path {
        match self {
            TranscodeOutcome::Encoded { target } | TranscodeOutcome::AlreadyPresent { target } => target,
        }
    }
}

/// Path of the transcode target, next to the source.
pub fn target_path(source: &Path, job: &TranscodeJob, geometry: &Geometry) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(target_file_name(&file_name, job, geometry))
}

/// Encodes into a staging file and promotes it on success.
pub struct TranscodeExecutor<'a> {
    encoder: &'a dyn Encoder,
}

impl<'a> TranscodeExecutor<'a> {
    pub fn new(encoder: &'a dyn Encoder) -> Self {
        Self { encoder }
    }

    /// Skips when the target exists. A failed encode leaves only the staging
    /// file, which the next attempt overwrites.
    pub fn execute(
        &self,
        source: &Path,
        job: &TranscodeJob,
        geometry: &Geometry,
    ) -> Result<TranscodeOutcome, PipelineError> {
        let target = target_path(source, job, geometry);
        if target.exists() {
            debug!("Target exists: {}", target.display());
            return Ok(TranscodeOutcome::AlreadyPresent { target });
        }

        let staging = media_staging_path(&target);
        let params = EncodeParams {
            input: source.to_path_buf(),
            output: staging.clone(),
            codec: job.codec,
            crf: job.crf,
            resize_width: job.resize.map(|r| r.width),
            slice: job.slice,
        };
        info!("Encoding {} -> {}", source.display(), target.display());
        self.encoder
            .encode(&params)
            .map_err(|e| PipelineError::tool(source, e))?;
        promote(&staging, &target).map_err(|e| PipelineError::io(&target, e))?;

        Ok(TranscodeOutcome::Encoded { target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEncoder;
    use std::fs;
    use tempfile::TempDir;

    const SCENARIO: &str = "AliceSmith_BobJones_MyTitle_1920x1080_30fps_h264_crf20.mp4";
    const TARGET: &str = "AliceSmith_BobJones_MyTitle_1920x1080_30fps_h265_crf18.mp4";

    fn geometry(width: u32, height: u32) -> Geometry {
        Geometry { width, height, fps: 30 }
    }

    fn h265_crf18() -> TranscodeJob {
        TranscodeJob {
            codec: TargetCodec::H265,
            crf: 18,
            resize: None,
            slice: None,
        }
    }

    #[test]
    fn test_resize_only_when_wider_than_max() {
        let settings = TranscodeConfig {
            max_width: Some(1280),
            ..TranscodeConfig::default()
        };
        let job = TranscodeJob::for_source(&settings, &geometry(1920, 1080));
        assert_eq!(job.resize, Some(Resize { width: 1280, height: 720 }));

        let job = TranscodeJob::for_source(&settings, &geometry(1280, 720));
        assert_eq!(job.resize, None);

        let job = TranscodeJob::for_source(&TranscodeConfig::default(), &geometry(3840, 2160));
        assert_eq!(job.resize, None);
    }

    #[test]
    fn test_resize_height_is_rounded() {
        let settings = TranscodeConfig {
            max_width: Some(1000),
            ..TranscodeConfig::default()
        };
        let job = TranscodeJob::for_source(&settings, &geometry(1920, 1080));
        assert_eq!(job.resize, Some(Resize { width: 1000, height: 563 }));
    }

    #[test]
    fn test_scenario_encode_promotes_target() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join(SCENARIO);
        fs::write(&source, b"source").unwrap();
        let encoder = FakeEncoder::new();

        let outcome = TranscodeExecutor::new(&encoder)
            .execute(&source, &h265_crf18(), &geometry(1920, 1080))
            .unwrap();

        let target = temp_dir.path().join(TARGET);
        assert_eq!(outcome, TranscodeOutcome::Encoded { target: target.clone() });
        assert!(target.exists());
        assert!(!media_staging_path(&target).exists());
        let calls = encoder.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].output, media_staging_path(&target));
        assert_eq!(calls[0].crf, 18);
    }

    #[test]
    fn test_existing_target_is_not_reencoded() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join(SCENARIO);
        fs::write(&source, b"source").unwrap();
        fs::write(temp_dir.path().join(TARGET), b"done").unwrap();
        let encoder = FakeEncoder::new();

        let outcome = TranscodeExecutor::new(&encoder)
            .execute(&source, &h265_crf18(), &geometry(1920, 1080))
            .unwrap();

        assert!(matches!(outcome, TranscodeOutcome::AlreadyPresent { .. }));
        assert!(encoder.calls().is_empty());
        assert_eq!(fs::read(temp_dir.path().join(TARGET)).unwrap(), b"done");
    }

    #[test]
    fn test_failed_encode_leaves_only_staging_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join(SCENARIO);
        fs::write(&source, b"source").unwrap();
        let encoder = FakeEncoder::failing();

        let err = TranscodeExecutor::new(&encoder)
            .execute(&source, &h265_crf18(), &geometry(1920, 1080))
            .unwrap_err();

        let target = temp_dir.path().join(TARGET);
        assert!(matches!(err, PipelineError::ExternalToolFailure { .. }));
        assert!(!target.exists());
        assert!(media_staging_path(&target).exists());
        assert!(source.exists());
    }

    #[test]
    fn test_leftover_staging_file_is_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join(SCENARIO);
        let target = temp_dir.path().join(TARGET);
        fs::write(&source, b"source").unwrap();
        fs::write(media_staging_path(&target), b"partial").unwrap();

        TranscodeExecutor::new(&FakeEncoder::new())
            .execute(&source, &h265_crf18(), &geometry(1920, 1080))
            .unwrap();

        assert_eq!(fs::read(&target).unwrap(), crate::testing::ENCODED_BYTES);
    }
}
