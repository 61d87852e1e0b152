//! Transcode candidate selection.
//!
//! Candidates are the media files directly in the source directory, largest
//! first. The cheap name and size checks run before the probe so that files
//! which need no work never cost a tool invocation.

use std::fmt;

use crate::config::TranscodeConfig;
use crate::error::PipelineError;
use crate::probe::{AssetProbe, Geometry, StreamKind};
use crate::scan::{is_staging_file, list_media_files, sort_largest_first, SourceFile};

/// Why a candidate needs no transcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// In-flight staging file of an interrupted encode.
    Staging,
    /// The name already carries the target codec marker.
    CodecMarkerInName { marker: String },
    BelowMinimumSize { size: u64, min: u64 },
    /// The video stream is already in the target codec family.
    AlreadyTargetFamily { codec: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Staging => write!(f, "temporary file"),
            SkipReason::CodecMarkerInName { marker } => write!(f, "name contains '{}'", marker),
            SkipReason::BelowMinimumSize { size, min } => {
                write!(f, "small file ({} < {} bytes)", size, min)
            }
            SkipReason::AlreadyTargetFamily { codec } => write!(f, "the file is {}", codec),
        }
    }
}

/// A selected candidate with what the probe told about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedSource {
    pub file: SourceFile,
    pub geometry: Geometry,
    pub codec_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Selected(ProbedSource),
    Skipped(SkipReason),
}

pub struct TranscodeSelector<'a> {
    settings: &'a TranscodeConfig,
    probe: &'a dyn AssetProbe,
}

impl<'a> TranscodeSelector<'a> {
    pub fn new(settings: &'a TranscodeConfig, probe: &'a dyn AssetProbe) -> Self {
        Self { settings, probe }
    }

    /// Media files of the source directory, largest first.
    pub fn candidates(&self) -> Result<Vec<SourceFile>, PipelineError> {
        let mut files = list_media_files(&self.settings.source_dir)?;
        sort_largest_first(&mut files);
        Ok(files)
    }

    /// Decides whether one candidate needs a transcode.
    pub fn evaluate(&self, file: &SourceFile) -> Result<Selection, PipelineError> {
        if is_staging_file(&file.path) {
            return Ok(Selection::Skipped(SkipReason::Staging));
        }

        let marker = self.settings.codec.marker();
        if file.file_name().contains(marker) {
            return Ok(Selection::Skipped(SkipReason::CodecMarkerInName {
                marker: marker.to_string(),
            }));
        }

        if file.size_bytes < self.settings.min_bytes {
            return Ok(Selection::Skipped(SkipReason::BelowMinimumSize {
                size: file.size_bytes,
                min: self.settings.min_bytes,
            }));
        }

        let report = self
            .probe
            .probe(&file.path)
            .map_err(|e| PipelineError::tool(&file.path, e))?;
        let video = report.require_stream(&file.path, StreamKind::Video)?;
        if self
            .settings
            .codec
            .family_codec_names()
            .contains(&video.codec_name.as_str())
        {
            return Ok(Selection::Skipped(SkipReason::AlreadyTargetFamily {
                codec: video.codec_name.clone(),
            }));
        }

        Ok(Selection::Selected(ProbedSource {
            file: file.clone(),
            geometry: Geometry::from_stream(video),
            codec_name: video.codec_name.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetCodec;
    use crate::testing::{probe_report, FakeProbe};
    use proptest::prelude::*;
    use std::path::PathBuf;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn file(name: &str, size_bytes: u64) -> SourceFile {
        SourceFile {
            path: PathBuf::from("/videos").join(name),
            size_bytes,
        }
    }

    #[test]
    fn test_selects_large_h264_source() {
        let settings = TranscodeConfig::default();
        let probe = FakeProbe::new(probe_report(600, "h264"));
        let selector = TranscodeSelector::new(&settings, &probe);

        let selection = selector
            .evaluate(&file("AliceSmith_BobJones_MyTitle_1920x1080_30fps_h264_crf20.mp4", 2 * GIB))
            .unwrap();

        match selection {
            Selection::Selected(source) => {
                assert_eq!(source.geometry, Geometry { width: 1920, height: 1080, fps: 30 });
                assert_eq!(source.codec_name, "h264");
            }
            other => panic!("expected selection, got {:?}", other),
        }
    }

    #[test]
    fn test_marker_in_name_skips_without_probe() {
        let settings = TranscodeConfig::default();
        let probe = FakeProbe::new(probe_report(600, "h264"));
        let selector = TranscodeSelector::new(&settings, &probe);

        let selection = selector
            .evaluate(&file("Title_1920x1080_30fps_h265_crf18.mp4", 2 * GIB))
            .unwrap();

        assert_eq!(
            selection,
            Selection::Skipped(SkipReason::CodecMarkerInName { marker: "h265".to_string() })
        );
        assert_eq!(probe.calls(), 0);
    }

    #[test]
    fn test_staging_and_small_files_skip_without_probe() {
        let settings = TranscodeConfig::default();
        let probe = FakeProbe::new(probe_report(600, "h264"));
        let selector = TranscodeSelector::new(&settings, &probe);

        assert_eq!(
            selector.evaluate(&file("Title_1920x1080_30fps_av1_crf18.tmp.mp4", 2 * GIB)).unwrap(),
            Selection::Skipped(SkipReason::Staging)
        );
        assert_eq!(
            selector.evaluate(&file("clip.mp4", GIB - 1)).unwrap(),
            Selection::Skipped(SkipReason::BelowMinimumSize { size: GIB - 1, min: GIB })
        );
        assert_eq!(probe.calls(), 0);
    }

    #[test]
    fn test_target_family_by_probe() {
        let settings = TranscodeConfig::default();
        let probe = FakeProbe::new(probe_report(600, "hevc"));
        let selector = TranscodeSelector::new(&settings, &probe);

        assert_eq!(
            selector.evaluate(&file("holiday.mp4", 2 * GIB)).unwrap(),
            Selection::Skipped(SkipReason::AlreadyTargetFamily { codec: "hevc".to_string() })
        );

        let av1 = TranscodeConfig {
            codec: TargetCodec::Av1Svt,
            ..TranscodeConfig::default()
        };
        let probe = FakeProbe::new(probe_report(600, "av1"));
        assert!(matches!(
            TranscodeSelector::new(&av1, &probe).evaluate(&file("holiday.mp4", 2 * GIB)).unwrap(),
            Selection::Skipped(SkipReason::AlreadyTargetFamily { .. })
        ));
    }

    #[test]
    fn test_missing_video_stream_is_an_error() {
        let settings = TranscodeConfig::default();
        let mut report = probe_report(600, "h264");
        report.streams.retain(|s| s.is(StreamKind::Audio));
        let probe = FakeProbe::new(report);

        let err = TranscodeSelector::new(&settings, &probe)
            .evaluate(&file("holiday.mp4", 2 * GIB))
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingStream { kind: StreamKind::Video, .. }));
    }

    #[test]
    fn test_candidates_are_largest_first() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("small.mp4"), b"1").unwrap();
        std::fs::write(temp_dir.path().join("large.mp4"), b"12345").unwrap();
        std::fs::write(temp_dir.path().join("medium.mp4"), b"123").unwrap();
        let settings = TranscodeConfig {
            source_dir: temp_dir.path().to_path_buf(),
            ..TranscodeConfig::default()
        };
        let probe = FakeProbe::new(probe_report(600, "h264"));

        let names: Vec<String> = TranscodeSelector::new(&settings, &probe)
            .candidates()
            .unwrap()
            .iter()
            .map(SourceFile::file_name)
            .collect();
        assert_eq!(names, vec!["large.mp4", "medium.mp4", "small.mp4"]);
    }

    fn codec_strategy() -> impl Strategy<Value = TargetCodec> {
        prop_oneof![
            Just(TargetCodec::H265),
            Just(TargetCodec::Av1Svt),
            Just(TargetCodec::Av1Rav),
            Just(TargetCodec::Av1),
            Just(TargetCodec::Copy),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_never_selects_marker_or_small_files(
            codec in codec_strategy(),
            stem in "[A-Za-z0-9_]{1,30}",
            size in 0u64..4 * GIB,
            min_bytes in 0u64..4 * GIB,
        ) {
            let settings = TranscodeConfig {
                codec,
                min_bytes,
                ..TranscodeConfig::default()
            };
            let probe = FakeProbe::new(probe_report(600, "h264"));
            let candidate = file(&format!("{}.mp4", stem), size);

            if let Selection::Selected(source) = TranscodeSelector::new(&settings, &probe).evaluate(&candidate).unwrap() {
                prop_assert!(!source.file.file_name().contains(codec.marker()));
                prop_assert!(source.file.size_bytes >= min_bytes);
            }
        }
    }
}
