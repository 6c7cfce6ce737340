//! Loading `~/.photoscenery/config.ini`.
//!
//! The file is optional and read-only: a missing file yields defaults.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration key: {section}.{key}")]
    MissingKey { section: String, key: String },

    #[error("Unknown map server id {0}")]
    UnknownServer(u32),
}

impl ConfigFile {
    /// Load from the default path.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, returning defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }
}

/// `~/.photoscenery`
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".photoscenery")
}

/// `~/.photoscenery/config.ini`
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
