//! Port-specific error types.
//!
//! These describe failures of the serial collaborators themselves (enumeration,
//! open, control lines). The reset sequencer decides which of them abort an
//! attempt and which are absorbed.

use thiserror::Error;

/// Errors that can occur while talking to the OS serial layer.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// The port exists but could not be opened (busy, permission denied, ...).
    #[error("Serial port {port} is unavailable: {message}")]
    Unavailable { port: String, message: String },

    /// Listing the available ports failed.
    #[error("Port enumeration failed: {0}")]
    Enumeration(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create an Unavailable error for a port that refused to open.
    pub fn unavailable(port_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            port: port_name.into(),
            message: message.into(),
        }
    }

    /// Create an Enumeration error from a message.
    pub fn enumeration(message: impl Into<String>) -> Self {
        Self::Enumeration(message.into())
    }
}
