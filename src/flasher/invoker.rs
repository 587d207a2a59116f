//! Running the external flashing tool.

use crate::error::FlashError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs a flashing tool as an opaque external process.
///
/// Implementations return both output streams so callers can log them; a
/// non-zero exit is `FlashError::Failed` with the streams attached.
#[async_trait]
pub trait FlasherInvoker: Send + Sync {
    async fn invoke(&self, program: &Path, args: &[String]) -> Result<ToolOutput, FlashError>;
}

/// Spawns the tool with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

#[async_trait]
impl FlasherInvoker for ProcessInvoker {
    async fn invoke(&self, program: &Path, args: &[String]) -> Result<ToolOutput, FlashError> {
        debug!(program = %program.display(), ?args, "Invoking flasher");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| FlashError::Launch {
                program: program.to_path_buf(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(ToolOutput { stdout, stderr })
        } else {
            Err(FlashError::Failed {
                program: program.to_path_buf(),
                code: output.status.code(),
                stdout,
                stderr,
            })
        }
    }
}
