//! Subcommands.

pub mod config;
pub mod parse;

use std::path::{Path, PathBuf};

use rollscan_core::RollscanConfig;

/// `<config dir>/rollscan/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rollscan")
        .join("config.json")
}

/// Load the explicit config file, else the default one if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RollscanConfig> {
    if let Some(path) = config_path {
        return Ok(RollscanConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        Ok(RollscanConfig::from_file(&default_path)?)
    } else {
        Ok(RollscanConfig::default())
    }
}
