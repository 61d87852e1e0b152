//! Core configuration structures and loading logic

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file
    Io(std::io::Error),
    /// TOML parsing error
    Parse(toml::de::Error),
    /// A value parsed but makes no sense for the pipelines
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Target codec of the compress pipeline.
///
/// The lowercase name doubles as the codec marker token written into target
/// file names, so none of them may contain an underscore.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetCodec {
    /// HEVC through libx265.
    #[default]
    H265,
    /// AV1 through SVT-AV1.
    Av1Svt,
    /// AV1 through rav1e.
    Av1Rav,
    /// AV1 through libaom.
    Av1,
    /// Stream copy, used to cut slices without re-encoding.
    Copy,
}

impl TargetCodec {
    /// Token written into target file names.
    pub fn marker(&self) -> &'static str {
        match self {
            TargetCodec::H265 => "h265",
            TargetCodec::Av1Svt => "av1svt",
            TargetCodec::Av1Rav => "av1rav",
            TargetCodec::Av1 => "av1",
            TargetCodec::Copy => "copy",
        }
    }

    /// Probe codec names that already belong to this codec family.
    pub fn family_codec_names(&self) -> &'static [&'static str] {
        match self {
            TargetCodec::H265 => &["h265", "hevc"],
            TargetCodec::Av1Svt | TargetCodec::Av1Rav | TargetCodec::Av1 => &["av1"],
            TargetCodec::Copy => &[],
        }
    }
}

impl fmt::Display for TargetCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

impl FromStr for TargetCodec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "h265" | "hevc" => Ok(TargetCodec::H265),
            "av1svt" => Ok(TargetCodec::Av1Svt),
            "av1rav" => Ok(TargetCodec::Av1Rav),
            "av1" => Ok(TargetCodec::Av1),
            "copy" => Ok(TargetCodec::Copy),
            other => Err(ConfigError::Invalid(format!("unknown codec '{}'", other))),
        }
    }
}

/// A time window cut out of the source while transcoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SliceConfig {
    pub start_secs: u64,
    pub duration_secs: u64,
}

impl FromStr for SliceConfig {
    type Err = ConfigError;

    /// Parses `START:DURATION` in whole seconds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::Invalid(format!("slice '{}' is not START:DURATION", s));
        let (start, duration) = s.split_once(':').ok_or_else(invalid)?;
        Ok(SliceConfig {
            start_secs: start.trim().parse().map_err(|_| invalid())?,
            duration_secs: duration.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// Paths of the external tools both pipelines shell out to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
    #[serde(default = "default_mediainfo")]
    pub mediainfo: PathBuf,
    #[serde(default = "default_transmission_create")]
    pub transmission_create: PathBuf,
    #[serde(default = "default_transmission_remote")]
    pub transmission_remote: PathBuf,
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_mediainfo() -> PathBuf {
    PathBuf::from("mediainfo")
}

fn default_transmission_create() -> PathBuf {
    PathBuf::from("transmission-create")
}

fn default_transmission_remote() -> PathBuf {
    PathBuf::from("transmission-remote")
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffprobe: default_ffprobe(),
            ffmpeg: default_ffmpeg(),
            mediainfo: default_mediainfo(),
            transmission_create: default_transmission_create(),
            transmission_remote: default_transmission_remote(),
        }
    }
}

/// Publish pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishConfig {
    /// Directory holding the source videos
    #[serde(default = "default_current_dir")]
    pub input_dir: PathBuf,
    /// Scratch workspace root, one subdirectory per asset key
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// Tracker announce URL embedded in torrent descriptors
    #[serde(default)]
    pub announce_url: String,
    /// Mark torrent descriptors private
    #[serde(default = "default_true")]
    pub private: bool,
    #[serde(default = "default_thumbnail_count")]
    pub thumbnail_count: u32,
    #[serde(default = "default_thumbnail_interval_secs")]
    pub thumbnail_interval_secs: u64,
    /// Width of captured frames; height follows the aspect ratio
    #[serde(default = "default_thumbnail_width")]
    pub thumbnail_width: u32,
    /// Metadata dump lines starting with this prefix are dropped
    #[serde(default = "default_metadata_strip_prefix")]
    pub metadata_strip_prefix: String,
    /// Text put in front of every generated title
    #[serde(default)]
    pub title_prefix: String,
    /// Release source label used in titles, e.g. "WEBRip"
    #[serde(default = "default_source_label")]
    pub source_label: String,
}

fn default_current_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("workdir")
}

fn default_true() -> bool {
    true
}

fn default_thumbnail_count() -> u32 {
    19
}

fn default_thumbnail_interval_secs() -> u64 {
    120
}

fn default_thumbnail_width() -> u32 {
    600
}

fn default_metadata_strip_prefix() -> String {
    "Encoding settings".to_string()
}

fn default_source_label() -> String {
    "WEBRip".to_string()
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            input_dir: default_current_dir(),
            scratch_dir: default_scratch_dir(),
            announce_url: String::new(),
            private: default_true(),
            thumbnail_count: default_thumbnail_count(),
            thumbnail_interval_secs: default_thumbnail_interval_secs(),
            thumbnail_width: default_thumbnail_width(),
            metadata_strip_prefix: default_metadata_strip_prefix(),
            title_prefix: String::new(),
            source_label: default_source_label(),
        }
    }
}

/// Where the completion listing comes from
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompletionConfig {
    /// Remote seeding host; the tool's own default when unset
    #[serde(default)]
    pub host: Option<String>,
    /// `user:password` passed to the remote
    #[serde(default)]
    pub auth: Option<String>,
}

/// Compress pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscodeConfig {
    #[serde(default = "default_current_dir")]
    pub source_dir: PathBuf,
    #[serde(default)]
    pub codec: TargetCodec,
    #[serde(default = "default_crf")]
    pub crf: u8,
    /// Sources wider than this are scaled down to it
    #[serde(default)]
    pub max_width: Option<u32>,
    #[serde(default)]
    pub slice: Option<SliceConfig>,
    /// Sources smaller than this are left alone
    #[serde(default = "default_min_bytes")]
    pub min_bytes: u64,
    /// Player the comparison launcher opens both files with
    #[serde(default = "default_compare_player")]
    pub compare_player: String,
    #[serde(default = "default_launcher_extension")]
    pub launcher_extension: String,
    #[serde(default = "default_report_file")]
    pub report_file: String,
    #[serde(default = "default_archive_dir_name")]
    pub archive_dir_name: String,
}

fn default_crf() -> u8 {
    20
}

fn default_min_bytes() -> u64 {
    1024 * 1024 * 1024
}

fn default_compare_player() -> String {
    "gridplayer".to_string()
}

fn default_launcher_extension() -> String {
    "sh".to_string()
}

fn default_report_file() -> String {
    "report.txt".to_string()
}

fn default_archive_dir_name() -> String {
    "original".to_string()
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            source_dir: default_current_dir(),
            codec: TargetCodec::default(),
            crf: default_crf(),
            max_width: None,
            slice: None,
            min_bytes: default_min_bytes(),
            compare_player: default_compare_player(),
            launcher_extension: default_launcher_extension(),
            report_file: default_report_file(),
            archive_dir_name: default_archive_dir_name(),
        }
    }
}

fn default_typos() -> BTreeMap<String, String> {
    BTreeMap::from([("Doesnt".to_string(), "Doesn't".to_string())])
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub transcode: TranscodeConfig,
    /// Exact-substring corrections applied to decoded titles
    #[serde(default = "default_typos")]
    pub typos: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tools: ToolsConfig::default(),
            publish: PublishConfig::default(),
            completion: CompletionConfig::default(),
            transcode: TranscodeConfig::default(),
            typos: default_typos(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Parses the config file and handles missing optional fields with defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Overrides the following values if environment variables are set:
    /// - VIDPUB_INPUT_DIR -> publish.input_dir
    /// - VIDPUB_SCRATCH_DIR -> publish.scratch_dir
    /// - VIDPUB_ANNOUNCE_URL -> publish.announce_url
    /// - VIDPUB_SOURCE_DIR -> transcode.source_dir
    /// - VIDPUB_CODEC -> transcode.codec
    /// - VIDPUB_CRF -> transcode.crf
    /// - VIDPUB_MIN_BYTES -> transcode.min_bytes
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("VIDPUB_INPUT_DIR") {
            self.publish.input_dir = PathBuf::from(val);
        }

        if let Ok(val) = env::var("VIDPUB_SCRATCH_DIR") {
            self.publish.scratch_dir = PathBuf::from(val);
        }

        if let Ok(val) = env::var("VIDPUB_ANNOUNCE_URL") {
            self.publish.announce_url = val;
        }

        if let Ok(val) = env::var("VIDPUB_SOURCE_DIR") {
            self.transcode.source_dir = PathBuf::from(val);
        }

        // Unknown codec names keep the existing value
        if let Ok(val) = env::var("VIDPUB_CODEC") {
            if let Ok(codec) = val.parse::<TargetCodec>() {
                self.transcode.codec = codec;
            }
        }

        if let Ok(val) = env::var("VIDPUB_CRF") {
            if let Ok(crf) = val.parse::<u8>() {
                self.transcode.crf = crf;
            }
        }

        if let Ok(val) = env::var("VIDPUB_MIN_BYTES") {
            if let Ok(bytes) = val.parse::<u64>() {
                self.transcode.min_bytes = bytes;
            }
        }
    }

    /// Reject values neither pipeline can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transcode.crf > 63 {
            return Err(ConfigError::Invalid(format!(
                "transcode.crf must be at most 63, got {}",
                self.transcode.crf
            )));
        }
        if self.transcode.max_width == Some(0) {
            return Err(ConfigError::Invalid("transcode.max_width must be positive".into()));
        }
        if matches!(self.transcode.slice, Some(slice) if slice.duration_secs == 0) {
            return Err(ConfigError::Invalid("transcode.slice duration must be positive".into()));
        }
        if self.transcode.archive_dir_name.trim().is_empty() {
            return Err(ConfigError::Invalid("transcode.archive_dir_name is empty".into()));
        }
        if self.publish.thumbnail_count == 0
            || self.publish.thumbnail_interval_secs == 0
            || self.publish.thumbnail_width == 0
        {
            return Err(ConfigError::Invalid(
                "publish thumbnail count, interval and width must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Load configuration from file and apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but starts from defaults when no file is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests don't interfere with each other
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Helper to clear all config-related env vars
    fn clear_env_vars() {
        env::remove_var("VIDPUB_INPUT_DIR");
        env::remove_var("VIDPUB_SCRATCH_DIR");
        env::remove_var("VIDPUB_ANNOUNCE_URL");
        env::remove_var("VIDPUB_SOURCE_DIR");
        env::remove_var("VIDPUB_CODEC");
        env::remove_var("VIDPUB_CRF");
        env::remove_var("VIDPUB_MIN_BYTES");
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
        fn prop_config_parses_transcode_section(
            codec in codec_strategy(),
            crf in 0u8..=63,
            max_width in proptest::option::of(1u32..8000),
            min_bytes in 0u64..u64::MAX / 2,
        ) {
            let toml_str = format!(
                r#"
[transcode]
codec = "{}"
crf = {}
{}
min_bytes = {}
"#,
                codec,
                crf,
                max_width.map(|w| format!("max_width = {}", w)).unwrap_or_default(),
                min_bytes,
            );

            let config = Config::parse_toml(&toml_str).expect("Valid TOML should parse");

            prop_assert_eq!(config.transcode.codec, codec);
            prop_assert_eq!(config.transcode.crf, crf);
            prop_assert_eq!(config.transcode.max_width, max_width);
            prop_assert_eq!(config.transcode.min_bytes, min_bytes);
            prop_assert!(config.validate().is_ok());
        }

        #[test]
        fn prop_env_overrides_crf(
            initial_crf in 0u8..=63,
            override_crf in 0u8..=63,
        ) {
            let _guard = ENV_MUTEX.lock().unwrap();
            clear_env_vars();

            let toml_str = format!("[transcode]\ncrf = {}\n", initial_crf);
            let mut config = Config::parse_toml(&toml_str).expect("Valid TOML");

            env::set_var("VIDPUB_CRF", override_crf.to_string());
            config.apply_env_overrides();
            clear_env_vars();

            prop_assert_eq!(config.transcode.crf, override_crf);
        }

        #[test]
        fn prop_slice_parses_start_and_duration(start in 0u64..100_000, duration in 1u64..100_000) {
            let slice: SliceConfig = format!("{}:{}", start, duration).parse().unwrap();
            prop_assert_eq!(slice, SliceConfig { start_secs: start, duration_secs: duration });
        }
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse_toml("").expect("Empty TOML should parse");

        assert_eq!(config.tools.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(config.publish.thumbnail_count, 19);
        assert_eq!(config.publish.thumbnail_interval_secs, 120);
        assert_eq!(config.publish.thumbnail_width, 600);
        assert_eq!(config.publish.metadata_strip_prefix, "Encoding settings");
        assert!(config.publish.private);
        assert_eq!(config.transcode.codec, TargetCodec::H265);
        assert_eq!(config.transcode.crf, 20);
        assert_eq!(config.transcode.min_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.transcode.archive_dir_name, "original");
        assert_eq!(config.typos.get("Doesnt").map(String::as_str), Some("Doesn't"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_typos_table_replaces_default() {
        let config = Config::parse_toml("[typos]\nTeh = \"The\"\n").unwrap();
        assert_eq!(config.typos.len(), 1);
        assert_eq!(config.typos["Teh"], "The");
    }

    #[test]
    fn test_env_override_ignores_unknown_codec() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env_vars();

        let mut config = Config::parse_toml("[transcode]\ncodec = \"av1svt\"\n").unwrap();
        env::set_var("VIDPUB_CODEC", "mpeg2");
        config.apply_env_overrides();
        clear_env_vars();

        assert_eq!(config.transcode.codec, TargetCodec::Av1Svt);
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut config = Config::default();
        config.transcode.crf = 80;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.transcode.slice = Some(SliceConfig { start_secs: 10, duration_secs: 0 });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.publish.thumbnail_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_codec_markers_have_no_delimiter() {
        for codec in [
            TargetCodec::H265,
            TargetCodec::Av1Svt,
            TargetCodec::Av1Rav,
            TargetCodec::Av1,
            TargetCodec::Copy,
        ] {
            assert!(!codec.marker().contains('_'));
            assert_eq!(codec.marker().parse::<TargetCodec>().unwrap(), codec);
        }
    }

    #[test]
    fn test_slice_rejects_garbage() {
        assert!("90".parse::<SliceConfig>().is_err());
        assert!("a:b".parse::<SliceConfig>().is_err());
    }
}
