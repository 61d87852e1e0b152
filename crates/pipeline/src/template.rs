//! Title and description text of a published asset.

use crate::asset::Asset;
use crate::config::PublishConfig;

const BYTES_PER_GB: f64 = 1_000_000_000.0;

/// Release label of a probed codec name.
pub fn codec_label(codec_name: &str) -> &str {
    match codec_name {
        "hevc" | "h265" => "x265",
        "h264" => "x264",
        "av1" => "AV1",
        other => other,
    }
}

/// `4m 05s` style duration.
pub fn format_duration(secs: u64) -> String {
    format!("{}m {:02}s", secs / 60, secs % 60)
}

/// Kilobits per second with unit, or `unknown`.
fn format_bitrate(bps: u64) -> String {
    if bps == 0 {
        "unknown".to_string()
    } else {
        format!("{} kb/s", bps / 1000)
    }
}

/// One-line release title.
pub fn render_title(asset: &Asset, settings: &PublishConfig) -> String {
    let mut parts = Vec::new();
    let prefix = settings.title_prefix.trim();
    let head = if asset.contributors.is_empty() {
        asset.title.clone()
    } else {
        format!("{} - {}", asset.contributors.join(", "), asset.title)
    };
    if prefix.is_empty() {
        parts.push(head);
    } else {
        parts.push(format!("{} {}", prefix, head));
    }
    parts.push(format!(
        "{} {}p {}",
        settings.source_label,
        asset.meta.height,
        codec_label(&asset.meta.video_codec)
    ));
    parts.join(" - ")
}

/// BBCode description block.
pub fn render_description(asset: &Asset) -> String {
    let meta = &asset.meta;
    let contributors = if asset.contributors.is_empty() {
        "n/a".to_string()
    } else {
        asset.contributors.join(", ")
    };

    let mut out = String::new();
    out.push_str(&format!("[b]{}[/b]\n\n", asset.title));
    out.push_str(&format!("[b]Duration:[/b] {}\n", format_duration(meta.duration_secs)));
    out.push_str(&format!("[b]Featuring:[/b] {}\n\n", contributors));
    out.push_str("[b]Technical details[/b]\n");
    out.push_str(&format!(
        "[b]Quality:[/b] {}x{} @ {} fps\n",
        meta.width, meta.height, meta.fps
    ));
    out.push_str("[b]Format:[/b] MP4\n");
    out.push_str(&format!(
        "[b]Video:[/b] {}, {}\n",
        codec_label(&meta.video_codec),
        format_bitrate(meta.video_bps)
    ));
    out.push_str(&format!(
        "[b]Audio:[/b] {}, {}\n",
        meta.audio_codec,
        format_bitrate(meta.audio_bps)
    ));
    out.push_str("[b]Files:[/b] 1\n");
    out.push_str(&format!(
        "[b]Size:[/b] {:.2} GB\n",
        meta.file_size as f64 / BYTES_PER_GB
    ));
    out
}
