//! Touch reset and reattach sequencing.
//!
//! # Architecture
//!
//! ```text
//! BootloaderReset::reset(port)
//!   ├─ ReattachWatcher::snapshot()         ports before the touch
//!   ├─ Toucher::touch(port)                1200 baud, DTR low, close
//!   └─ ReattachWatcher::wait_for_reset()   disappear, reappear, resolve
//! ```
//!
//! The snapshot is always taken before the touch so a device that happened to
//! drop off on its own cannot be mistaken for the touch's effect.

pub mod toucher;
pub mod watcher;

pub use toucher::Toucher;
pub use watcher::ReattachWatcher;

use crate::config::ResetConfig;
use crate::error::ResetError;
use crate::port::{PortEnumerator, PortOpener, PortSet};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// How to follow the device after the touch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReattachMode {
    /// Return the touched port without watching enumeration.
    NoWait,
    /// Wait for the port to disappear and reappear.
    #[default]
    Reattach,
    /// Wait for an additional port to show up.
    NewPort,
}

impl FromStr for ReattachMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "no-wait" | "none" => Ok(Self::NoWait),
            "reattach" => Ok(Self::Reattach),
            "new-port" => Ok(Self::NewPort),
            other => Err(format!(
                "unknown reattach mode '{other}' (expected no-wait, reattach or new-port)"
            )),
        }
    }
}

/// The record of one reset sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetAttempt {
    /// The port the caller asked to reset.
    pub original_port: String,
    /// Enumeration captured before the touch.
    pub ports_before_touch: PortSet,
    /// The port to hand to the flasher. Equal to `original_port` when no
    /// reattach was observed.
    pub resolved_port: String,
    /// Time spent touching and watching.
    pub elapsed: Duration,
}

impl ResetAttempt {
    /// Whether the device came back under a different name.
    pub fn port_changed(&self) -> bool {
        self.resolved_port != self.original_port
    }
}

/// Runs complete touch reset sequences.
#[derive(Debug, Clone)]
pub struct BootloaderReset<E, O> {
    toucher: Toucher<O>,
    watcher: ReattachWatcher<E>,
}

impl<E: PortEnumerator, O: PortOpener> BootloaderReset<E, O> {
    pub fn new(enumerator: E, opener: O, config: &ResetConfig) -> Self {
        Self {
            toucher: Toucher::new(opener, config),
            watcher: ReattachWatcher::new(enumerator, config),
        }
    }

    pub fn watcher(&self) -> &ReattachWatcher<E> {
        &self.watcher
    }

    /// Touch `port` and resolve the port the bootloader shows up on.
    ///
    /// Fails only if the touch itself fails; enumeration trouble and timeouts
    /// resolve to `port`.
    pub async fn reset(&self, port: &str, mode: ReattachMode) -> Result<ResetAttempt, ResetError> {
        info!(port, "Restarting in bootloader mode");
        let started = Instant::now();

        let ports_before_touch = self.watcher.snapshot();
        debug!(ports = %ports_before_touch, "Port list before reset");

        self.toucher.touch(port).await?;

        let resolved_port = match mode {
            ReattachMode::NoWait => port.to_string(),
            ReattachMode::Reattach => self.watcher.wait_for_reset(&ports_before_touch, port).await,
            ReattachMode::NewPort => {
                self.watcher
                    .wait_for_new_port(&ports_before_touch, port)
                    .await
            }
        };

        let attempt = ResetAttempt {
            original_port: port.to_string(),
            ports_before_touch,
            resolved_port,
            elapsed: started.elapsed(),
        };
        if attempt.port_changed() {
            info!(
                from = %attempt.original_port,
                to = %attempt.resolved_port,
                "Device reattached under a new port"
            );
        }
        Ok(attempt)
    }
}
