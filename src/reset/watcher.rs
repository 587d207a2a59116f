//! Watching the port list while a touched device reboots.
//!
//! After a touch the device usually drops off the bus and comes back, possibly
//! under a different name (`COM3` becoming `COM5`, `ttyACM0` becoming
//! `ttyACM1`). The watcher polls enumeration until it has seen the
//! disappearance and the reappearance, and reports the name to flash.
//! Enumeration is treated as opaque: nothing here knows how an OS names ports.

use crate::config::ResetConfig;
use crate::port::{PortEnumerator, PortSet};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Overall time budget for one watch, shared by all of its phases.
///
/// A background timer cancels the token when the budget is spent; pollers
/// select on it instead of reading a plain flag.
#[derive(Debug)]
struct Deadline {
    token: CancellationToken,
    timer: JoinHandle<()>,
    at: Instant,
}

impl Deadline {
    fn start(timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let expiry = token.clone();
        let timer = tokio::spawn(async move {
            sleep(timeout).await;
            expiry.cancel();
        });

        Self {
            token,
            timer,
            at: Instant::now() + timeout,
        }
    }

    fn is_expired(&self) -> bool {
        self.token.is_cancelled()
    }

    fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

/// Resolves the port a device reattached under after a touch reset.
#[derive(Debug, Clone)]
pub struct ReattachWatcher<E> {
    enumerator: E,
    poll_interval: Duration,
    reappear_settle_delay: Duration,
    timeout: Duration,
}

impl<E: PortEnumerator> ReattachWatcher<E> {
    pub fn new(enumerator: E, config: &ResetConfig) -> Self {
        Self {
            enumerator,
            poll_interval: config.poll_interval(),
            reappear_settle_delay: config.reappear_settle_delay(),
            timeout: config.timeout(),
        }
    }

    /// Upper bound on how long `wait_for_reset` can take.
    pub fn max_wait(&self) -> Duration {
        self.timeout + self.poll_interval + self.reappear_settle_delay
    }

    /// Take one enumeration snapshot. A failed enumeration is logged and
    /// reads as an empty set.
    pub fn snapshot(&self) -> PortSet {
        self.observe().unwrap_or_default()
    }

    /// One poll. `None` means enumeration failed and nothing was observed.
    fn observe(&self) -> Option<PortSet> {
        match self.enumerator.list_ports() {
            Ok(ports) => {
                trace!(ports = %ports, "Enumerated ports");
                Some(ports)
            }
            Err(e) => {
                warn!("Port enumeration failed, retrying: {}", e);
                None
            }
        }
    }

    /// Wait for the touched device to drop off and come back.
    ///
    /// `ports_before` must have been captured before the touch. The watch first
    /// polls until the current port list differs from `ports_before` (the
    /// device vanished), then takes a fresh baseline and polls until the list
    /// differs from that (the device is back). The reappeared name is returned
    /// after a short settle delay. If the budget runs out first,
    /// `original_port` is returned: the device may never have left, or it came
    /// back under the same name too quickly to notice.
    pub async fn wait_for_reset(&self, ports_before: &PortSet, original_port: &str) -> String {
        let deadline = Deadline::start(self.timeout);

        match self.poll_until_differs(ports_before, &deadline).await {
            Some(port) => debug!(port = %port, "Port disappeared"),
            // A slow device and one that never leaves look the same from here.
            None => debug!("No port disappeared within the time budget"),
        }

        info!("Waiting for the port to reappear");
        let reappeared = match self.observe_until_ok(&deadline).await {
            Some(after_reset) => self.poll_until_differs(&after_reset, &deadline).await,
            None => None,
        };
        match reappeared {
            Some(port) => {
                sleep(self.reappear_settle_delay).await;
                info!(port = %port, "Port reappeared");
                port
            }
            None => {
                info!(
                    port = original_port,
                    "No reattach observed, using the original port"
                );
                original_port.to_string()
            }
        }
    }

    /// Wait for any port to differ from `ports_before`, in a single phase.
    ///
    /// Suits bootloaders that expose an extra port rather than replacing the
    /// existing one. Falls back to `original_port` on timeout.
    pub async fn wait_for_new_port(&self, ports_before: &PortSet, original_port: &str) -> String {
        let deadline = Deadline::start(self.timeout);

        match self.poll_until_differs(ports_before, &deadline).await {
            Some(port) => {
                info!(port = %port, "New port detected");
                port
            }
            None => {
                info!(
                    port = original_port,
                    "No new port observed, using the original port"
                );
                original_port.to_string()
            }
        }
    }

    /// Poll until the port list differs from `baseline` or the deadline passes.
    ///
    /// Always polls at least once, even with an already expired deadline.
    /// Failed polls are skipped.
    async fn poll_until_differs(&self, baseline: &PortSet, deadline: &Deadline) -> Option<String> {
        loop {
            if let Some(port) = self.observe().and_then(|current| current.differ(baseline)) {
                return Some(port);
            }
            if deadline.is_expired() {
                return None;
            }
            self.tick(deadline).await;
        }
    }

    /// Poll until enumeration succeeds or the deadline passes.
    async fn observe_until_ok(&self, deadline: &Deadline) -> Option<PortSet> {
        loop {
            if let Some(ports) = self.observe() {
                return Some(ports);
            }
            if deadline.is_expired() {
                return None;
            }
            self.tick(deadline).await;
        }
    }

    /// Sleep one poll interval, waking early if the deadline passes.
    async fn tick(&self, deadline: &Deadline) {
        trace!(remaining = ?deadline.remaining(), "No change yet");
        tokio::select! {
            _ = deadline.token.cancelled() => {}
            _ = sleep(self.poll_interval) => {}
        }
    }
}
