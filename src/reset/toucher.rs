//! The 1200 baud touch.
//!
//! Many USB bootloaders (Caterina, SAM-BA, UF2 CDC) watch for the host opening
//! the port at 1200 baud and dropping DTR, and reboot into programming mode
//! when they see it.

use crate::config::ResetConfig;
use crate::error::ResetError;
use crate::port::PortOpener;
use std::time::Duration;
use tracing::{debug, info};

/// Issues the touch reset on a named port.
#[derive(Debug, Clone)]
pub struct Toucher<O> {
    opener: O,
    baud_rate: u32,
    settle_delay: Duration,
}

impl<O: PortOpener> Toucher<O> {
    pub fn new(opener: O, config: &ResetConfig) -> Self {
        Self {
            opener,
            baud_rate: config.touch_baud,
            settle_delay: config.touch_settle_delay(),
        }
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Open `port` at the touch baud rate, clear DTR and close it again.
    ///
    /// The handle is dropped before this returns on every path. After a
    /// successful touch the settle delay elapses so the bootloader has time to
    /// come up before anyone enumerates ports again.
    pub async fn touch(&self, port: &str) -> Result<(), ResetError> {
        info!(port, baud_rate = self.baud_rate, "Touching port");

        {
            let mut handle =
                self.opener
                    .open(port, self.baud_rate)
                    .map_err(|source| ResetError::PortOpen {
                        port: port.to_string(),
                        baud_rate: self.baud_rate,
                        source,
                    })?;

            handle
                .set_dtr(false)
                .map_err(|source| ResetError::ControlLine {
                    port: port.to_string(),
                    source,
                })?;
            debug!(port = handle.name(), "DTR cleared");
        }

        tokio::time::sleep(self.settle_delay).await;
        Ok(())
    }
}
