//! Mock serial collaborators for testing.
//!
//! `MockPorts` simulates a host whose port list changes over time, without any
//! hardware. Enumeration results are scripted per call, opens and DTR changes
//! can be made to fail, and every interaction is recorded so tests can check
//! ordering and that handles were released.

use super::error::PortError;
use super::set::PortSet;
use super::traits::{PortEnumerator, PortHandle, PortOpener};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// One interaction with the mock, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    /// `list_ports` was called.
    List,
    /// A port was opened at the given baud rate.
    Open { port: String, baud_rate: u32 },
    /// DTR was driven on an open port.
    SetDtr { port: String, level: bool },
    /// A handle was dropped.
    Close { port: String },
}

/// Inner state of the mock, shared between clones and open handles.
#[derive(Debug, Default)]
struct MockPortsState {
    /// Scripted results for upcoming `list_ports` calls.
    script: VecDeque<Result<PortSet, String>>,
    /// Returned once the script is exhausted; tracks the last scripted success.
    steady: PortSet,
    /// Error message for the next open, if it should fail.
    open_failure: Option<String>,
    /// Error message for DTR changes, if they should fail.
    dtr_failure: Option<String>,
    /// Everything that happened so far.
    events: Vec<MockEvent>,
    /// Handles currently held open.
    open_handles: usize,
}

/// Mock port backend implementing both `PortEnumerator` and `PortOpener`.
///
/// # Example
/// ```
/// use touch_flasher::port::{MockPorts, PortEnumerator};
///
/// let ports = MockPorts::new(["COM3", "COM4"]);
/// ports.then_list(["COM4"]);
/// ports.then_list(["COM4", "COM5"]);
///
/// assert_eq!(ports.list_ports().unwrap().len(), 1);
/// assert!(ports.list_ports().unwrap().contains("COM5"));
/// // The last scripted snapshot repeats.
/// assert!(ports.list_ports().unwrap().contains("COM5"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockPorts {
    state: Arc<Mutex<MockPortsState>>,
}

impl MockPorts {
    /// Create a mock whose enumeration reports `ports` until scripted otherwise.
    pub fn new<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: Arc::new(Mutex::new(MockPortsState {
                steady: ports.into_iter().collect(),
                ..Default::default()
            })),
        }
    }

    /// Queue a snapshot for the next unscripted `list_ports` call.
    pub fn then_list<I, S>(&self, ports: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .lock()
            .script
            .push_back(Ok(ports.into_iter().collect()));
        self
    }

    /// Queue `count` identical snapshots.
    pub fn then_list_times<S: AsRef<str>>(&self, ports: &[S], count: usize) -> &Self {
        for _ in 0..count {
            self.then_list(ports.iter().map(|p| p.as_ref().to_string()));
        }
        self
    }

    /// Queue an enumeration failure.
    pub fn then_fail(&self, message: impl Into<String>) -> &Self {
        self.state.lock().script.push_back(Err(message.into()));
        self
    }

    /// Make the next `open` fail with the given message.
    pub fn fail_next_open(&self, message: impl Into<String>) {
        self.state.lock().open_failure = Some(message.into());
    }

    /// Make every DTR change fail with the given message.
    pub fn fail_dtr(&self, message: impl Into<String>) {
        self.state.lock().dtr_failure = Some(message.into());
    }

    /// Get a copy of all recorded interactions.
    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().events.clone()
    }

    /// Number of `list_ports` calls so far.
    pub fn list_calls(&self) -> usize {
        self.state
            .lock()
            .events
            .iter()
            .filter(|e| matches!(e, MockEvent::List))
            .count()
    }

    /// Number of handles currently held open.
    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }

    /// Number of scripted snapshots not yet consumed.
    pub fn remaining_script(&self) -> usize {
        self.state.lock().script.len()
    }
}

impl PortEnumerator for MockPorts {
    fn list_ports(&self) -> Result<PortSet, PortError> {
        let mut state = self.state.lock();
        state.events.push(MockEvent::List);

        match state.script.pop_front() {
            Some(Ok(ports)) => {
                state.steady = ports.clone();
                Ok(ports)
            }
            Some(Err(message)) => Err(PortError::enumeration(message)),
            None => Ok(state.steady.clone()),
        }
    }
}

impl PortOpener for MockPorts {
    fn open(&self, name: &str, baud_rate: u32) -> Result<Box<dyn PortHandle>, PortError> {
        let mut state = self.state.lock();

        if let Some(message) = state.open_failure.take() {
            return Err(PortError::unavailable(name, message));
        }

        state.events.push(MockEvent::Open {
            port: name.to_string(),
            baud_rate,
        });
        state.open_handles += 1;

        Ok(Box::new(MockPortHandle {
            name: name.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

/// Handle returned by `MockPorts::open`.
struct MockPortHandle {
    name: String,
    state: Arc<Mutex<MockPortsState>>,
}

impl PortHandle for MockPortHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_dtr(&mut self, level: bool) -> Result<(), PortError> {
        let mut state = self.state.lock();

        if let Some(message) = state.dtr_failure.clone() {
            return Err(PortError::Io(std::io::Error::other(message)));
        }

        state.events.push(MockEvent::SetDtr {
            port: self.name.clone(),
            level,
        });
        Ok(())
    }
}

impl Drop for MockPortHandle {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
        state.events.push(MockEvent::Close {
            port: self.name.clone(),
        });
    }
}

impl std::fmt::Debug for MockPortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPortHandle")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscripted_listing_returns_initial_ports() {
        let ports = MockPorts::new(["COM1"]);
        let listed = ports.list_ports().unwrap();
        assert!(listed.contains("COM1"));
        assert_eq!(ports.list_calls(), 1);
    }

    #[test]
    fn test_script_is_consumed_in_order() {
        let ports = MockPorts::new(["A"]);
        ports.then_list(["B"]).then_fail("boom").then_list(["C"]);

        assert!(ports.list_ports().unwrap().contains("B"));
        assert!(matches!(ports.list_ports(), Err(PortError::Enumeration(_))));
        assert!(ports.list_ports().unwrap().contains("C"));
        assert!(ports.list_ports().unwrap().contains("C"));
        assert_eq!(ports.remaining_script(), 0);
    }

    #[test]
    fn test_failure_does_not_change_steady_state() {
        let ports = MockPorts::new(["A"]);
        ports.then_fail("transient");

        assert!(ports.list_ports().is_err());
        assert!(ports.list_ports().unwrap().contains("A"));
    }

    #[test]
    fn test_open_and_drop_are_tracked() {
        let ports = MockPorts::new(["COM3"]);
        let mut handle = ports.open("COM3", 1200).unwrap();
        assert_eq!(ports.open_handles(), 1);

        handle.set_dtr(false).unwrap();
        drop(handle);

        assert_eq!(ports.open_handles(), 0);
        assert_eq!(
            ports.events(),
            vec![
                MockEvent::Open {
                    port: "COM3".into(),
                    baud_rate: 1200
                },
                MockEvent::SetDtr {
                    port: "COM3".into(),
                    level: false
                },
                MockEvent::Close {
                    port: "COM3".into()
                },
            ]
        );
    }

    #[test]
    fn test_open_failure_is_one_shot() {
        let ports = MockPorts::new(["COM3"]);
        ports.fail_next_open("busy");

        assert!(matches!(
            ports.open("COM3", 1200),
            Err(PortError::Unavailable { .. })
        ));
        assert_eq!(ports.open_handles(), 0);
        assert!(ports.open("COM3", 1200).is_ok());
    }

    #[test]
    fn test_dtr_failure() {
        let ports = MockPorts::new(["COM3"]);
        ports.fail_dtr("ioctl failed");

        let mut handle = ports.open("COM3", 1200).unwrap();
        assert!(handle.set_dtr(false).is_err());
    }
}
