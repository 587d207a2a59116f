//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::reset::ReattachMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Touch reset and reattach timing
    pub reset: ResetConfig,
    /// External flasher invocation
    pub flasher: FlasherConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values that would make the sequencer spin or never start.
    pub fn validate(&self) -> ConfigResult<()> {
        self.reset.validate()?;
        self.flasher.validate()
    }
}

/// Touch reset section.
///
/// The defaults match what most 1200 baud bootloaders expect; tests shrink
/// them to keep the suite fast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetConfig {
    /// Baud rate that signals the bootloader
    pub touch_baud: u32,
    /// Pause after closing the touched port
    pub touch_settle_ms: u64,
    /// Pause after the device node reappears
    pub reappear_settle_ms: u64,
    /// Interval between enumeration polls
    pub poll_interval_ms: u64,
    /// Overall budget for the disappear/reappear watch
    pub timeout_ms: u64,
    /// How to follow the device after the touch
    pub reattach: ReattachMode,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            touch_baud: 1200,
            touch_settle_ms: 200,
            reappear_settle_ms: 500,
            poll_interval_ms: 100,
            timeout_ms: 10_000,
            reattach: ReattachMode::Reattach,
        }
    }
}

impl ResetConfig {
    pub fn touch_settle_delay(&self) -> Duration {
        Duration::from_millis(self.touch_settle_ms)
    }

    pub fn reappear_settle_delay(&self) -> Duration {
        Duration::from_millis(self.reappear_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.touch_baud == 0 {
            return Err(ConfigError::invalid("reset.touch_baud", "must be non-zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "reset.poll_interval_ms",
                "must be non-zero",
            ));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::invalid("reset.timeout_ms", "must be non-zero"));
        }
        Ok(())
    }
}

/// External flasher section (avrdude command line).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlasherConfig {
    /// avrdude.conf location; derived from the programmer path when unset
    pub config_file: Option<PathBuf>,
    /// Target part (`-p`)
    pub part: String,
    /// Programmer id (`-c`)
    pub programmer: String,
    /// Programmer baud rate (`-b`)
    pub baud_rate: u32,
    /// Pass `-v` to the tool
    pub verbose: bool,
    /// Extra operations appended to every write
    pub extra_write_args: Vec<String>,
    /// Pause after a write so the board can reboot
    pub post_flash_delay_ms: u64,
    /// Touch the port before invoking the tool
    pub touch_before_flash: bool,
}

impl Default for FlasherConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            part: "atmega4809".to_string(),
            programmer: "xplainedmini_updi".to_string(),
            baud_rate: 115_200,
            verbose: true,
            extra_write_args: vec!["-Ufuse8:w:0x00:m".to_string()],
            post_flash_delay_ms: 3_000,
            touch_before_flash: true,
        }
    }
}

impl FlasherConfig {
    pub fn post_flash_delay(&self) -> Duration {
        Duration::from_millis(self.post_flash_delay_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.part.trim().is_empty() {
            return Err(ConfigError::invalid("flasher.part", "must not be empty"));
        }
        if self.programmer.trim().is_empty() {
            return Err(ConfigError::invalid(
                "flasher.programmer",
                "must not be empty",
            ));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::invalid("flasher.baud_rate", "must be non-zero"));
        }
        Ok(())
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset: "trace", "debug", "info", ...
    pub level: String,
    /// Log format: "pretty" or "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented
    #[default]
    Pretty,
    /// Single line per event
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.reset.touch_baud, 1200);
        assert_eq!(config.reset.touch_settle_delay(), Duration::from_millis(200));
        assert_eq!(config.reset.reappear_settle_delay(), Duration::from_millis(500));
        assert_eq!(config.reset.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.reset.timeout(), Duration::from_secs(10));
        assert_eq!(config.flasher.part, "atmega4809");
        assert_eq!(config.flasher.post_flash_delay(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[reset]"));
        assert!(toml_str.contains("[flasher]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [reset]
            timeout_ms = 4000
            poll_interval_ms = 50
            reattach = "new-port"

            [flasher]
            part = "atmega328p"
            programmer = "arduino"

            [logging]
            format = "compact"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.reset.timeout_ms, 4000);
        assert_eq!(config.reset.poll_interval_ms, 50);
        assert_eq!(config.reset.reattach, ReattachMode::NewPort);
        assert_eq!(config.flasher.part, "atmega328p");
        assert_eq!(config.logging.format, LogFormat::Compact);
        // Defaults should still work
        assert_eq!(config.reset.touch_baud, 1200);
        assert_eq!(config.flasher.baud_rate, 115_200);
    }

    #[test]
    fn test_validation_rejects_zero_poll_interval() {
        let mut config = Config::default();
        config.reset.poll_interval_ms = 0;

        match config.validate() {
            Err(ConfigError::Invalid { key, .. }) => {
                assert_eq!(key, "reset.poll_interval_ms")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_rejects_empty_part() {
        let mut config = Config::default();
        config.flasher.part = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
