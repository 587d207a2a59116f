//! Port abstraction layer for the serial collaborators.
//!
//! Provides the enumeration/open traits, the `serialport`-backed system
//! implementation and a scripted mock for tests.

pub mod error;
pub mod mock;
pub mod set;
pub mod system;
pub mod traits;

pub use error::PortError;
pub use mock::{MockEvent, MockPorts};
pub use set::PortSet;
pub use system::{SystemPortHandle, SystemPorts};
pub use traits::*;
