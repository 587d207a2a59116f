//! Shared test utilities for touch-flasher integration tests.
//!
//! This module provides:
//! - Compressed reset timings so paused-clock tests stay readable
//! - Builders for mock-backed resets and flashers
//! - A helper to script a device dropping off and coming back

#![allow(dead_code)]

use touch_flasher::config::{FlasherConfig, ResetConfig};
use touch_flasher::{BootloaderReset, Flasher, MockInvoker, MockPorts, PortSet, ReattachMode};

/// Poll interval used by the compressed timings.
pub const POLL_MS: u64 = 10;
/// Reappearance settle delay used by the compressed timings.
pub const SETTLE_MS: u64 = 50;
/// Overall watch budget used by the compressed timings.
pub const TIMEOUT_MS: u64 = 1_000;

/// Reset timings scaled down by ten.
pub fn fast_reset_config() -> ResetConfig {
    ResetConfig {
        touch_settle_ms: 20,
        reappear_settle_ms: SETTLE_MS,
        poll_interval_ms: POLL_MS,
        timeout_ms: TIMEOUT_MS,
        ..Default::default()
    }
}

/// Flasher settings with no post-flash pause.
pub fn fast_flasher_config() -> FlasherConfig {
    FlasherConfig {
        post_flash_delay_ms: 0,
        ..Default::default()
    }
}

pub fn port_set(ports: &[&str]) -> PortSet {
    ports.iter().copied().collect()
}

/// Build a reset sequencer over a mock.
pub fn mock_reset(ports: &MockPorts) -> BootloaderReset<MockPorts, MockPorts> {
    BootloaderReset::new(ports.clone(), ports.clone(), &fast_reset_config())
}

/// Build a flasher over mocks.
pub fn mock_flasher(
    ports: &MockPorts,
    invoker: &MockInvoker,
) -> Flasher<MockPorts, MockPorts, MockInvoker> {
    Flasher::new(
        mock_reset(ports),
        ReattachMode::Reattach,
        invoker.clone(),
        fast_flasher_config(),
    )
}

/// Script a touch that makes the device vanish and come back.
///
/// The first scripted listing is consumed by the snapshot taken before the
/// touch. Then the device is present for `stay` polls, absent for `gone`
/// polls, and finally visible again as `reappears_as`. The absence lasts at
/// least two polls: one to notice the departure and one for the baseline the
/// reappearance is measured against.
pub fn script_reattach(
    ports: &MockPorts,
    others: &[&str],
    device: &str,
    stay: usize,
    gone: usize,
    reappears_as: &str,
) {
    let mut before: Vec<&str> = others.to_vec();
    before.push(device);
    let mut after: Vec<&str> = others.to_vec();
    after.push(reappears_as);

    ports.then_list(before.clone());
    ports.then_list_times(before.as_slice(), stay);
    ports.then_list_times(others, gone.max(2));
    ports.then_list(after);
}
