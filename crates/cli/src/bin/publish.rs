//! vidpub-publish: derive release artifacts for every pending video.

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use vidpub::tools::{
    FfmpegFrameCapture, FfprobeProbe, MediaInfoDumper, TransmissionCreate, TransmissionRemote,
};
use vidpub::{PublishPipeline, PublishTools};
use vidpub_cli::{init_logging, load_config};

/// Build thumbnails, metadata report, description and torrent for each video
#[derive(Parser, Debug)]
#[command(name = "vidpub-publish")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the source videos
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Scratch workspace root
    #[arg(short, long)]
    scratch_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match load_config(args.config.as_deref(), |c| {
        if let Some(dir) = args.input_dir.clone() {
            c.publish.input_dir = dir;
        }
        if let Some(dir) = args.scratch_dir.clone() {
            c.publish.scratch_dir = dir;
        }
        Ok(())
    }) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Input directory: {}", config.publish.input_dir.display());
    info!("Scratch directory: {}", config.publish.scratch_dir.display());

    let probe = FfprobeProbe::new(&config.tools.ffprobe);
    let oracle = TransmissionRemote::new(&config.tools.transmission_remote, config.completion.clone());
    let frames = FfmpegFrameCapture::new(&config.tools.ffmpeg);
    let dumper = MediaInfoDumper::new(&config.tools.mediainfo);
    let torrents = TransmissionCreate::new(&config.tools.transmission_create);
    let tools = PublishTools {
        probe: &probe,
        oracle: &oracle,
        frames: &frames,
        dumper: &dumper,
        torrents: &torrents,
    };

    match PublishPipeline::new(&config.publish, &config.typos, tools).run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
