// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** check the
/// registry invariants. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the config file if it exists, otherwise validate the built-in
/// defaults.
///
/// The pipeline works without any config file; `Assetdag.toml` only holds
/// overrides.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path.is_file() {
        info!(config = ?path, "loading config file");
        load_and_validate(path)
    } else {
        debug!(config = ?path, "no config file found; using defaults");
        ConfigFile::try_from(RawConfigFile::default())
    }
}

/// Resolve the config path given on the CLI against the project root.
pub fn config_path_for(root: &Path, config: &str) -> PathBuf {
    let p = Path::new(config);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}
