//! Flashing firmware through an external tool.
//!
//! The tool (avrdude by default) is never reimplemented: `Flasher` resets the
//! board, builds a command line for the resolved port and hands it to a
//! `FlasherInvoker`. Output from the tool is only logged.

pub mod avrdude;
pub mod invoker;
pub mod mock;

pub use avrdude::{build_args, default_config_file, Operation};
pub use invoker::{FlasherInvoker, ProcessInvoker, ToolOutput};
pub use mock::{Invocation, MockInvoker};

use crate::config::{Config, FlasherConfig};
use crate::error::FlashError;
use crate::port::{PortEnumerator, PortOpener, SystemPorts};
use crate::reset::{BootloaderReset, ReattachMode};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Prefix of the scratch directory holding memory dumps.
const DUMP_DIR_PREFIX: &str = "touch_flasher_dump";

/// File name of the memory dump inside the scratch directory.
const DUMP_FILE_NAME: &str = "dump.bin";

/// Resets boards and runs the flashing tool against them.
#[derive(Debug, Clone)]
pub struct Flasher<E, O, I> {
    reset: BootloaderReset<E, O>,
    reattach: ReattachMode,
    invoker: I,
    config: FlasherConfig,
}

impl Flasher<SystemPorts, SystemPorts, ProcessInvoker> {
    /// A flasher using the OS serial ports and a real child process.
    pub fn system(config: &Config) -> Self {
        Self::new(
            BootloaderReset::new(SystemPorts, SystemPorts, &config.reset),
            config.reset.reattach,
            ProcessInvoker,
            config.flasher.clone(),
        )
    }
}

impl<E, O, I> Flasher<E, O, I>
where
    E: PortEnumerator,
    O: PortOpener,
    I: FlasherInvoker,
{
    pub fn new(
        reset: BootloaderReset<E, O>,
        reattach: ReattachMode,
        invoker: I,
        config: FlasherConfig,
    ) -> Self {
        Self {
            reset,
            reattach,
            invoker,
            config,
        }
    }

    /// Reset the board and write `firmware` to it.
    ///
    /// The post-flash delay elapses whether or not the tool succeeded, so a
    /// half-programmed board still gets time to reboot before anyone retries.
    pub async fn flash_firmware(
        &self,
        programmer_path: &Path,
        port: &str,
        firmware: &Path,
    ) -> Result<(), FlashError> {
        info!(firmware = %firmware.display(), port, "Flashing");

        let port = self.prepare_port(port).await?;
        let result = self
            .run(programmer_path, &port, Operation::Write(firmware))
            .await;

        tokio::time::sleep(self.config.post_flash_delay()).await;
        result
    }

    /// Save the current flash contents to a scratch file, then write
    /// `firmware`.
    ///
    /// Returns the dump's path. Once the read has succeeded the scratch
    /// directory is kept for the caller, and a failure after that point is
    /// `FlashError::AfterDump` carrying the same path. If the read itself
    /// fails the directory is removed.
    pub async fn dump_then_flash(
        &self,
        programmer_path: &Path,
        port: &str,
        firmware: &Path,
    ) -> Result<PathBuf, FlashError> {
        info!(firmware = %firmware.display(), port, "Dumping current image, then flashing");

        let scratch = tempfile::Builder::new()
            .prefix(DUMP_DIR_PREFIX)
            .tempdir()
            .map_err(FlashError::ScratchDir)?;
        let dump_file = scratch.path().join(DUMP_FILE_NAME);

        let read_port = self.prepare_port(port).await?;
        self.run(programmer_path, &read_port, Operation::Read(&dump_file))
            .await?;
        let dump = scratch.keep().join(DUMP_FILE_NAME);
        info!(path = %dump.display(), "Original image saved");

        let result = self.write_after_dump(programmer_path, &read_port, firmware).await;

        tokio::time::sleep(self.config.post_flash_delay()).await;
        match result {
            Ok(()) => Ok(dump),
            Err(source) => {
                warn!(path = %dump.display(), "Flash failed, original image kept");
                Err(FlashError::AfterDump {
                    dump,
                    source: Box::new(source),
                })
            }
        }
    }

    // Leaving programming mode after the read restarts the application, so
    // touch again before writing.
    async fn write_after_dump(
        &self,
        programmer_path: &Path,
        read_port: &str,
        firmware: &Path,
    ) -> Result<(), FlashError> {
        let write_port = self.prepare_port(read_port).await?;
        self.run(programmer_path, &write_port, Operation::Write(firmware))
            .await
    }

    /// Touch the board if configured to, and return the port to program.
    async fn prepare_port(&self, port: &str) -> Result<String, FlashError> {
        if !self.config.touch_before_flash {
            return Ok(port.to_string());
        }

        let attempt = self.reset.reset(port, self.reattach).await?;
        Ok(attempt.resolved_port)
    }

    async fn run(
        &self,
        programmer_path: &Path,
        port: &str,
        operation: Operation<'_>,
    ) -> Result<(), FlashError> {
        let args = build_args(&self.config, programmer_path, port, operation);

        match self.invoker.invoke(programmer_path, &args).await {
            Ok(output) => {
                log_tool_output(&output.stdout, &output.stderr);
                Ok(())
            }
            Err(err) => {
                if let FlashError::Failed { stdout, stderr, .. } = &err {
                    log_tool_output(stdout, stderr);
                }
                Err(err)
            }
        }
    }
}

fn log_tool_output(stdout: &str, stderr: &str) {
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        debug!(target: "touch_flasher::tool", stream = "stdout", "{}", line);
    }
    // avrdude reports progress on stderr
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        debug!(target: "touch_flasher::tool", stream = "stderr", "{}", line);
    }
}
