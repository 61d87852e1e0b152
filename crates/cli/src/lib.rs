//! Shared setup of the vidpub binaries.

use std::path::Path;

use vidpub::config::{Config, ConfigError};

/// Initialise `env_logger`: `RUST_LOG` wins, else `info`, or `debug` when verbose.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

/// Loads the configuration (file or defaults, then `VIDPUB_*` overrides),
/// applies the command line flags through `flags` and validates the result.
pub fn load_config(
    path: Option<&Path>,
    flags: impl FnOnce(&mut Config) -> Result<(), ConfigError>,
) -> Result<Config, ConfigError> {
    let mut config = Config::load_or_default(path)?;
    flags(&mut config)?;
    config.validate()?;
    Ok(config)
}
