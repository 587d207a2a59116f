//! Touch Flasher Library
//!
//! Puts serial-attached microcontrollers into their bootloader with a 1200 baud
//! "touch", follows the device while it drops off the bus and comes back
//! (possibly under another port name), and runs an external flashing tool
//! against the port it came back on.
//!
//! # Modules
//!
//! - `config`: Configuration management with TOML support
//! - `error`: Reset and flash errors
//! - `port`: Port enumeration/open traits, the `serialport` backend and a mock
//! - `reset`: The touch and the reattach watcher
//! - `flasher`: avrdude command lines and the flash/dump operations
//! - `logging`: tracing subscriber setup for the binary

pub mod config;
pub mod error;
pub mod flasher;
pub mod logging;
pub mod port;
pub mod reset;

pub use error::{FlashError, ResetError};
pub use flasher::{Flasher, FlasherInvoker, MockInvoker, ProcessInvoker, ToolOutput};
pub use port::{
    MockEvent, MockPorts, PortEnumerator, PortError, PortHandle, PortOpener, PortSet, SystemPorts,
};
pub use reset::{BootloaderReset, ReattachMode, ReattachWatcher, ResetAttempt, Toucher};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
