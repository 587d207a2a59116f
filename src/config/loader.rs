//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::{Config, LogFormat};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "TOUCH_FLASHER";

/// Config file name inside the per-user config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config file name looked up in the current directory
const LOCAL_CONFIG_FILE_NAME: &str = "touch-flasher.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "TOUCH_FLASHER_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `TOUCH_FLASHER_CONFIG` environment variable (explicit path)
    /// 2. `./touch-flasher.toml` (current directory)
    /// 3. the platform config directory, e.g. `~/.config/touch-flasher/config.toml`
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values, and the result is validated.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        let _ = apply_env_overrides(&mut config);

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    if let Some(app_config) = get_default_config_path() {
        if app_config.exists() {
            return Some(app_config);
        }
    }

    None
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "touch-flasher").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Read `TOUCH_FLASHER_<key>` and parse it, if set.
fn env_value<T: FromStr>(key: &str, what: &str) -> ConfigResult<Option<T>> {
    let var = format!("{}_{}", ENV_PREFIX, key);
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_override(var, val.trim(), what)),
        Err(_) => Ok(None),
    }
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(format!("{}_{}", ENV_PREFIX, key))
        .ok()
        .map(|val| val.to_lowercase() == "true" || val == "1")
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `TOUCH_FLASHER_<SECTION>_<KEY>`
/// For example:
/// - `TOUCH_FLASHER_RESET_TIMEOUT_MS=5000`
/// - `TOUCH_FLASHER_FLASHER_PART=atmega328p`
/// - `TOUCH_FLASHER_LOGGING_LEVEL=debug`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Reset overrides
    if let Some(val) = env_value("RESET_TOUCH_BAUD", "expected a baud rate")? {
        config.reset.touch_baud = val;
    }
    if let Some(val) = env_value("RESET_TOUCH_SETTLE_MS", "expected milliseconds")? {
        config.reset.touch_settle_ms = val;
    }
    if let Some(val) = env_value("RESET_REAPPEAR_SETTLE_MS", "expected milliseconds")? {
        config.reset.reappear_settle_ms = val;
    }
    if let Some(val) = env_value("RESET_POLL_INTERVAL_MS", "expected milliseconds")? {
        config.reset.poll_interval_ms = val;
    }
    if let Some(val) = env_value("RESET_TIMEOUT_MS", "expected milliseconds")? {
        config.reset.timeout_ms = val;
    }
    if let Ok(val) = std::env::var(format!("{}_RESET_REATTACH", ENV_PREFIX)) {
        config.reset.reattach = val
            .parse()
            .map_err(|e: String| {
                ConfigError::env_override(format!("{}_RESET_REATTACH", ENV_PREFIX), &val, e)
            })?;
    }

    // Flasher overrides
    if let Ok(val) = std::env::var(format!("{}_FLASHER_CONFIG_FILE", ENV_PREFIX)) {
        config.flasher.config_file = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var(format!("{}_FLASHER_PART", ENV_PREFIX)) {
        config.flasher.part = val;
    }
    if let Ok(val) = std::env::var(format!("{}_FLASHER_PROGRAMMER", ENV_PREFIX)) {
        config.flasher.programmer = val;
    }
    if let Some(val) = env_value("FLASHER_BAUD_RATE", "expected a baud rate")? {
        config.flasher.baud_rate = val;
    }
    if let Some(val) = env_value("FLASHER_POST_FLASH_DELAY_MS", "expected milliseconds")? {
        config.flasher.post_flash_delay_ms = val;
    }
    if let Some(val) = env_flag("FLASHER_TOUCH_BEFORE_FLASH") {
        config.flasher.touch_before_flash = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var(format!("{}_LOGGING_LEVEL", ENV_PREFIX)) {
        config.logging.level = val;
    }
    if let Ok(val) = std::env::var(format!("{}_LOGGING_FORMAT", ENV_PREFIX)) {
        config.logging.format = match val.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => {
                return Err(ConfigError::env_override(
                    format!("{}_LOGGING_FORMAT", ENV_PREFIX),
                    &val,
                    "expected pretty or compact",
                ))
            }
        };
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reset::ReattachMode;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().reset.touch_baud, 1200);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("TOUCH_FLASHER_RESET_TIMEOUT_MS", "2500");
        env::set_var("TOUCH_FLASHER_FLASHER_PART", "atmega32u4");
        env::set_var("TOUCH_FLASHER_RESET_REATTACH", "no-wait");
        env::set_var("TOUCH_FLASHER_FLASHER_TOUCH_BEFORE_FLASH", "0");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().reset.timeout_ms, 2500);
        assert_eq!(loader.config().flasher.part, "atmega32u4");
        assert_eq!(loader.config().reset.reattach, ReattachMode::NoWait);
        assert!(!loader.config().flasher.touch_before_flash);

        env::remove_var("TOUCH_FLASHER_RESET_TIMEOUT_MS");
        env::remove_var("TOUCH_FLASHER_FLASHER_PART");
        env::remove_var("TOUCH_FLASHER_RESET_REATTACH");
        env::remove_var("TOUCH_FLASHER_FLASHER_TOUCH_BEFORE_FLASH");
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_is_reported() {
        env::set_var("TOUCH_FLASHER_RESET_POLL_INTERVAL_MS", "fast");

        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        assert!(matches!(result, Err(ConfigError::EnvOverride { .. })));

        env::remove_var("TOUCH_FLASHER_RESET_POLL_INTERVAL_MS");
    }

    #[test]
    #[serial]
    fn test_unknown_reattach_mode_names_the_variable() {
        env::set_var("TOUCH_FLASHER_RESET_REATTACH", "eventually");

        let mut config = Config::default();
        let err = apply_env_overrides(&mut config).unwrap_err();
        env::remove_var("TOUCH_FLASHER_RESET_REATTACH");

        match err {
            ConfigError::EnvOverride { var, value, .. } => {
                assert_eq!(var, "TOUCH_FLASHER_RESET_REATTACH");
                assert_eq!(value, "eventually");
            }
            other => panic!("expected an override error, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn test_malformed_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("touch-flasher.toml");
        std::fs::write(&path, "[reset\ntimeout_ms = 5\n").unwrap();

        let err = ConfigLoader::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("touch-flasher.toml"));
    }

    #[test]
    #[serial]
    fn test_load_from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut loader = ConfigLoader::with_defaults();
        loader.config.reset.reappear_settle_ms = 750;
        loader.config.flasher.extra_write_args.clear();
        loader.save_to(&path).unwrap();

        let reloaded = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(reloaded.config().reset.reappear_settle_ms, 750);
        assert!(reloaded.config().flasher.extra_write_args.is_empty());
        assert_eq!(reloaded.config_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    #[serial]
    fn test_load_from_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[reset]\ntimeout_ms = 0\n").unwrap();

        let result = ConfigLoader::load_from(&path);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    #[serial]
    fn test_missing_file_is_read_error() {
        let result = ConfigLoader::load_from("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
