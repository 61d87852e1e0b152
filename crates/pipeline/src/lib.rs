//! vidpub
//!
//! Resumable batch pipelines over a directory of videos. The publish pipeline
//! derives release artifacts per asset in a scratch workspace; the compress
//! pipeline transcodes large sources and archives the originals. Progress is
//! inferred from the file system on every run.

pub mod archive;
pub mod asset;
pub mod completion;
pub mod compress;
pub mod error;
pub mod janitor;
pub mod naming;
pub mod probe;
pub mod publish;
pub mod scan;
pub mod selector;
pub mod stages;
pub mod staging;
pub mod template;
pub mod tools;
pub mod transcode;

#[cfg(test)]
pub(crate) mod testing;

pub use vidpub_config as config;
pub use vidpub_config::Config;
pub use archive::{ArchiveMover, ArchiveRecord};
pub use asset::{Asset, VideoMetadata};
pub use completion::{CompletionOracle, CompletionSet};
pub use compress::{CompressPipeline, CompressSummary, CompressTools};
pub use error::{PipelineError, ToolError};
pub use janitor::WorkspaceJanitor;
pub use naming::{decode, target_file_name, DecodedName, NamingError};
pub use probe::{AssetProbe, Geometry, ProbeReport, StreamInfo, StreamKind};
pub use publish::{PublishPipeline, PublishSummary, PublishTools};
pub use selector::{Selection, SkipReason, TranscodeSelector};
pub use stages::{
    AssetWorkspace, FrameCapture, MetadataDumper, Stage, StageOutcome, StageReport, StageRunner,
    TorrentCreator,
};
pub use transcode::{EncodeParams, Encoder, TranscodeExecutor, TranscodeJob, TranscodeOutcome};
