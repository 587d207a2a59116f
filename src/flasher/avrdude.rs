//! avrdude command lines.

use crate::config::FlasherConfig;
use std::path::{Path, PathBuf};

/// What the tool should do with device memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    /// Erase, then write the Intel HEX image at the path.
    Write(&'a Path),
    /// Read flash into an Intel HEX file at the path.
    Read(&'a Path),
}

/// Where avrdude.conf lives for a bundled avrdude: `<bin>/../etc/avrdude.conf`.
pub fn default_config_file(programmer_path: &Path) -> PathBuf {
    programmer_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("..")
        .join("etc")
        .join("avrdude.conf")
}

/// Build the argument list for one avrdude run against `port`.
pub fn build_args(
    config: &FlasherConfig,
    programmer_path: &Path,
    port: &str,
    operation: Operation<'_>,
) -> Vec<String> {
    let conf = config
        .config_file
        .clone()
        .unwrap_or_else(|| default_config_file(programmer_path));

    let mut args = vec![format!("-C{}", conf.display())];
    if config.verbose {
        args.push("-v".to_string());
    }
    args.push(format!("-p{}", config.part));
    args.push(format!("-c{}", config.programmer));
    args.push(format!("-P{}", port));
    args.push(format!("-b{}", config.baud_rate));

    match operation {
        Operation::Write(image) => {
            args.push("-e".to_string());
            // -D: the chip erase above already cleared flash
            args.push("-D".to_string());
            args.push(format!("-Uflash:w:{}:i", image.display()));
            args.extend(config.extra_write_args.iter().cloned());
        }
        Operation::Read(dump) => {
            args.push("-D".to_string());
            args.push(format!("-Uflash:r:{}:i", dump.display()));
        }
    }

    args
}
