//! Errors raised while loading, checking or saving touch-flasher settings.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the `[reset]`, `[flasher]` and
    /// `[logging]` sections.
    #[error("Invalid TOML in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot encode settings as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Writing a config file (or creating its directory) failed.
    #[error("Cannot write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A setting is out of range, e.g. a zero poll interval.
    #[error("{key} {message}")]
    Invalid { key: String, message: String },

    /// A `TOUCH_FLASHER_*` override could not be parsed.
    #[error("{var}={value:?}: {message}")]
    EnvOverride {
        var: String,
        value: String,
        message: String,
    },
}

impl ConfigError {
    /// A rejected setting, named by its `section.key` path.
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_override(
        var: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::EnvOverride {
            var: var.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
