//! External tool adapters.
//!
//! Each adapter builds a `std::process::Command` in a public `build_command`
//! so the exact invocation is testable without spawning anything, and runs it
//! synchronously through [`process`].

pub mod ffmpeg;
pub mod ffprobe;
pub mod mediainfo;
pub mod process;
pub mod transmission;

pub use ffmpeg::{FfmpegEncoder, FfmpegFrameCapture};
pub use ffprobe::FfprobeProbe;
pub use mediainfo::MediaInfoDumper;
pub use transmission::{TransmissionCreate, TransmissionRemote};
