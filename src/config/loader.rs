// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{AppConfig, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; required values and limits are
/// checked once all layers are merged (see [`resolve`]).
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load the file if a path was given, otherwise start from an empty config.
pub fn load_optional(path: Option<&Path>) -> Result<RawConfigFile> {
    match path {
        Some(path) => load_from_path(path),
        None => Ok(RawConfigFile::default()),
    }
}

/// Build the run's configuration.
///
/// - Reads the optional config file.
/// - Layers `overrides` (flags and env vars) on top.
/// - Applies defaults and validates.
pub fn resolve(
    file: Option<&Path>,
    overrides: RawConfigFile,
    command: Vec<String>,
) -> Result<AppConfig> {
    let raw = load_optional(file)?.overlay(overrides);
    AppConfig::from_raw(raw, command)
}
