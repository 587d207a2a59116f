//! Serial collaborators backed by the operating system.
//!
//! Wraps the `serialport` crate behind the `PortEnumerator`, `PortOpener` and
//! `PortHandle` traits.

use super::error::PortError;
use super::set::PortSet;
use super::traits::{PortEnumerator, PortHandle, PortOpener};
use std::time::Duration;

/// Read/write timeout for handles opened by `SystemPorts`. The touch never
/// transfers data, so this only bounds driver calls.
const HANDLE_TIMEOUT: Duration = Duration::from_millis(500);

/// OS port enumeration and open, via the `serialport` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl SystemPorts {
    pub fn new() -> Self {
        Self
    }
}

impl PortEnumerator for SystemPorts {
    fn list_ports(&self) -> Result<PortSet, PortError> {
        let ports = serialport::available_ports()
            .map_err(|e| PortError::enumeration(e.to_string()))?;

        Ok(ports.into_iter().map(|info| info.port_name).collect())
    }
}

impl PortOpener for SystemPorts {
    fn open(&self, name: &str, baud_rate: u32) -> Result<Box<dyn PortHandle>, PortError> {
        let port = serialport::new(name, baud_rate)
            .timeout(HANDLE_TIMEOUT)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(name),
                serialport::ErrorKind::Io(kind)
                    if kind == std::io::ErrorKind::NotFound =>
                {
                    PortError::not_found(name)
                }
                serialport::ErrorKind::Io(_) => PortError::unavailable(name, e.to_string()),
                _ => PortError::Serial(e),
            })?;

        Ok(Box::new(SystemPortHandle {
            port,
            name: name.to_string(),
        }))
    }
}

/// Open handle wrapping `serialport::SerialPort`. Closed on drop.
pub struct SystemPortHandle {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The port name/path for identification.
    name: String,
}

impl PortHandle for SystemPortHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_dtr(&mut self, level: bool) -> Result<(), PortError> {
        self.port
            .write_data_terminal_ready(level)
            .map_err(PortError::Serial)
    }
}

impl std::fmt::Debug for SystemPortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemPortHandle")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}
