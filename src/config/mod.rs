//! Configuration module for touch-flasher.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `TOUCH_FLASHER_CONFIG` environment variable (explicit path)
//! 2. `./touch-flasher.toml` (current directory)
//! 3. `config.toml` in the platform config directory
//!    (`~/.config/touch-flasher/` on Linux, `%APPDATA%\touch-flasher\config\` on Windows)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Any configuration value can be overridden via environment variables.
//! The pattern is: `TOUCH_FLASHER_<SECTION>_<KEY>`
//!
//! Examples:
//! - `TOUCH_FLASHER_RESET_TIMEOUT_MS=5000`
//! - `TOUCH_FLASHER_RESET_POLL_INTERVAL_MS=50`
//! - `TOUCH_FLASHER_FLASHER_PROGRAMMER=arduino`
//!
//! # Example
//!
//! ```rust,ignore
//! use touch_flasher::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//!
//! println!("Touch baud: {}", config.reset.touch_baud);
//! println!("Reattach timeout: {:?}", config.reset.timeout());
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, FlasherConfig, LogFormat, LoggingConfig, ResetConfig};
