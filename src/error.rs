//! Errors surfaced to callers of the reset and flash operations.
//!
//! Enumeration failures never appear here: the watcher absorbs them and keeps
//! polling. A watch that runs out of time is not an error either, it resolves
//! to the port the caller started with.

use crate::port::PortError;
use std::path::PathBuf;
use thiserror::Error;

/// A touch reset could not be issued.
///
/// In both cases the port handle has already been released.
#[derive(Debug, Error)]
pub enum ResetError {
    /// The port could not be opened at the touch baud rate.
    #[error("Failed to open {port} at {baud_rate} baud: {source}")]
    PortOpen {
        port: String,
        baud_rate: u32,
        #[source]
        source: PortError,
    },

    /// The port opened but DTR could not be cleared.
    #[error("Failed to clear DTR on {port}: {source}")]
    ControlLine {
        port: String,
        #[source]
        source: PortError,
    },
}

/// The external flashing tool, or the reset preceding it, failed.
#[derive(Debug, Error)]
pub enum FlashError {
    /// The bootloader touch failed before the tool ran.
    #[error("Bootloader reset failed: {0}")]
    Reset(#[from] ResetError),

    /// The tool could not be started at all.
    #[error("Failed to launch {}: {source}", .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran and reported failure. Both output streams are kept verbatim.
    #[error("{} failed ({}): {}", .program.display(), describe_exit(.code), .stderr.trim_end())]
    Failed {
        program: PathBuf,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// No scratch directory could be created for a memory dump.
    #[error("Failed to create dump directory: {0}")]
    ScratchDir(#[source] std::io::Error),

    /// The device memory was saved, but writing the new image failed. The
    /// dump at `dump` is what the board held before.
    #[error("Flashing failed, previous image saved to {}: {source}", .dump.display())]
    AfterDump {
        dump: PathBuf,
        #[source]
        source: Box<FlashError>,
    },
}

impl FlashError {
    /// Path of the saved memory dump, if this failure happened after one was
    /// taken.
    pub fn dump_path(&self) -> Option<&std::path::Path> {
        match self {
            Self::AfterDump { dump, .. } => Some(dump.as_path()),
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}
