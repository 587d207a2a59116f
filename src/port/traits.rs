//! Core traits for the serial collaborators.
//!
//! The reset sequencer only needs three things from the OS: list the visible
//! ports, open one at a given baud rate, and drive its DTR line. Each is a
//! trait so that the real `serialport` backend and the mock used by the tests
//! can be swapped freely.

use super::error::PortError;
use super::set::PortSet;

/// An open serial port handle.
///
/// Dropping the handle closes the port.
pub trait PortHandle: Send + std::fmt::Debug {
    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Drive the Data Terminal Ready control line.
    fn set_dtr(&mut self, level: bool) -> Result<(), PortError>;
}

/// Source of port enumeration snapshots.
pub trait PortEnumerator: Send + Sync {
    /// List the serial device identifiers currently visible to the OS.
    fn list_ports(&self) -> Result<PortSet, PortError>;
}

/// Opens serial ports by name.
pub trait PortOpener: Send + Sync {
    /// Open `name` at `baud_rate` and return an exclusive handle to it.
    fn open(&self, name: &str, baud_rate: u32) -> Result<Box<dyn PortHandle>, PortError>;
}

impl<T: PortEnumerator + ?Sized> PortEnumerator for std::sync::Arc<T> {
    fn list_ports(&self) -> Result<PortSet, PortError> {
        (**self).list_ports()
    }
}

impl<T: PortOpener + ?Sized> PortOpener for std::sync::Arc<T> {
    fn open(&self, name: &str, baud_rate: u32) -> Result<Box<dyn PortHandle>, PortError> {
        (**self).open(name, baud_rate)
    }
}
