//! Tool configuration
//!
//! Defaults are compiled in from `tiffsplice.toml`. A user file passed with
//! `--config` is laid over them: keys it sets win, keys it omits keep
//! their default, unknown keys are ignored.

use lazy_static::lazy_static;
use log::debug;
use std::fs;

use crate::io::byte_order::ByteOrder;
use crate::tiff::errors::{TiffError, TiffResult};

lazy_static! {
    // Parse the embedded defaults once
    static ref DEFAULT_CONFIG: Config = {
        let content = include_str!("../tiffsplice.toml");
        Config::builtin().overlay_str(content).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to parse default configuration: {}", e);
            Config::builtin()
        })
    };
}

/// Settings used by the command line tool
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Byte order of newly created containers
    pub byte_order: ByteOrder,
    /// Digits in split output file names
    pub split_name_width: usize,
    /// Log file path
    pub log_file: String,
    /// Whether progress bars are drawn
    pub progress_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

impl Config {
    /// Values used when even the embedded file cannot be parsed
    fn builtin() -> Self {
        Config {
            byte_order: ByteOrder::LittleEndian,
            split_name_width: 4,
            log_file: "tiffsplice.log".to_string(),
            progress_enabled: true,
        }
    }

    /// Loads the defaults, overlaid with the file at `path` if one is given
    pub fn load(path: Option<&str>) -> TiffResult<Self> {
        let config = Config::default();

        match path {
            Some(path) => {
                debug!("Loading configuration from {}", path);
                let content = fs::read_to_string(path)
                    .map_err(|e| TiffError::ConfigError(format!("Cannot read {}: {}", path, e)))?;
                config.overlay_str(&content)
            },
            None => Ok(config),
        }
    }

    /// Returns a copy with the settings in `content` applied
    pub fn overlay_str(&self, content: &str) -> TiffResult<Self> {
        let toml_value: toml::Value = content.parse()
            .map_err(|e| TiffError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        let mut config = self.clone();

        if let Some(value) = lookup(&toml_value, "output", "byte_order") {
            let name = value.as_str()
                .ok_or_else(|| type_error("output.byte_order", "a string"))?;
            config.byte_order = ByteOrder::from_name(name)
                .ok_or_else(|| TiffError::ConfigError(format!("Unknown byte order: {}", name)))?;
        }

        if let Some(value) = lookup(&toml_value, "split", "name_width") {
            let width = value.as_integer()
                .ok_or_else(|| type_error("split.name_width", "an integer"))?;
            config.split_name_width = usize::try_from(width)
                .map_err(|_| TiffError::ConfigError(format!("Invalid split.name_width: {}", width)))?;
        }

        if let Some(value) = lookup(&toml_value, "logging", "file") {
            config.log_file = value.as_str()
                .ok_or_else(|| type_error("logging.file", "a string"))?
                .to_string();
        }

        if let Some(value) = lookup(&toml_value, "progress", "enabled") {
            config.progress_enabled = value.as_bool()
                .ok_or_else(|| type_error("progress.enabled", "a boolean"))?;
        }

        Ok(config)
    }
}

fn lookup<'v>(root: &'v toml::Value, section: &str, key: &str) -> Option<&'v toml::Value> {
    root.get(section).and_then(|table| table.get(key))
}

fn type_error(key: &str, expected: &str) -> TiffError {
    TiffError::ConfigError(format!("{} must be {}", key, expected))
}
