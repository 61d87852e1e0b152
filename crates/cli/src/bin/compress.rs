//! vidpub-compress: transcode large videos and archive the originals.

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use vidpub::config::{SliceConfig, TargetCodec};
use vidpub::tools::{FfmpegEncoder, FfprobeProbe};
use vidpub::{CompressPipeline, CompressTools};
use vidpub_cli::{init_logging, load_config};

/// Transcode every large video of a directory and move the originals aside
#[derive(Parser, Debug)]
#[command(name = "vidpub-compress")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the videos to compress
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Target codec: h265, av1svt, av1rav, av1 or copy
    #[arg(long)]
    codec: Option<TargetCodec>,

    /// Constant rate factor
    #[arg(long)]
    crf: Option<u8>,

    /// Scale sources wider than this down to it
    #[arg(long)]
    max_width: Option<u32>,

    /// Only encode START:DURATION seconds
    #[arg(long)]
    slice: Option<SliceConfig>,

    /// Leave files smaller than this many bytes alone
    #[arg(long)]
    min_bytes: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match load_config(args.config.as_deref(), |c| {
        let t = &mut c.transcode;
        if let Some(dir) = args.source_dir.clone() {
            t.source_dir = dir;
        }
        if let Some(codec) = args.codec {
            t.codec = codec;
        }
        if let Some(crf) = args.crf {
            t.crf = crf;
        }
        if args.max_width.is_some() {
            t.max_width = args.max_width;
        }
        if args.slice.is_some() {
            t.slice = args.slice;
        }
        if let Some(min_bytes) = args.min_bytes {
            t.min_bytes = min_bytes;
        }
        Ok(())
    }) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let settings = &config.transcode;
    info!("Source directory: {}", settings.source_dir.display());
    info!("Target: {} crf {}", settings.codec, settings.crf);

    let probe = FfprobeProbe::new(&config.tools.ffprobe);
    let encoder = FfmpegEncoder::new(&config.tools.ffmpeg);
    let tools = CompressTools {
        probe: &probe,
        encoder: &encoder,
    };

    match CompressPipeline::new(settings, tools).run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
