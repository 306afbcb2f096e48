pub mod clear;
pub mod config;
pub mod sync;
pub mod sync_ui;

use color_eyre::Result;
use discogs_sync_config::{Config, PathManager};
use std::path::PathBuf;

/// Load and validate the configuration from `explicit` or the default location
pub fn load_config(explicit: Option<PathBuf>) -> Result<(PathBuf, Config)> {
    let config_file = match explicit {
        Some(path) => path,
        None => PathManager::default_config_file()
            .map_err(|e| color_eyre::eyre::eyre!("{}", e))?,
    };
    let config = Config::load_or_default(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    config.validate()
        .map_err(|e| color_eyre::eyre::eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;
    Ok((config_file, config))
}
