use clap::{Parser, Subcommand};
use std::path::PathBuf;
use touch_flasher::config::{Config, ConfigLoader};
use touch_flasher::port::{PortEnumerator, SystemPorts};
use touch_flasher::{BootloaderReset, Flasher, ReattachMode};
use tracing::info;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Reset a board into its bootloader with a 1200 baud touch and flash it.",
    long_about = "Opens the board's serial port at 1200 baud and drops DTR, follows the device while it re-enumerates, and runs avrdude against the port it comes back on."
)]
struct Args {
    /// Configuration file. Defaults to the standard search path.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the serial ports currently visible.
    List,
    /// Touch a port and print the port the bootloader appears on.
    Reset {
        /// Serial port of the board.
        #[arg(short, long)]
        port: String,
        /// How to follow the device: no-wait, reattach or new-port.
        #[arg(long)]
        mode: Option<ReattachMode>,
    },
    /// Reset the board and write a firmware image.
    Flash {
        /// Path to the avrdude executable.
        #[arg(long)]
        programmer: PathBuf,
        /// Serial port of the board.
        #[arg(short, long)]
        port: String,
        /// Intel HEX image to write.
        firmware: PathBuf,
    },
    /// Save the current flash contents, then write a firmware image.
    DumpFlash {
        /// Path to the avrdude executable.
        #[arg(long)]
        programmer: PathBuf,
        /// Serial port of the board.
        #[arg(short, long)]
        port: String,
        /// Intel HEX image to write.
        firmware: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, Box<dyn std::error::Error>> {
    let loader = match path {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    Ok(loader.into_config())
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    touch_flasher::logging::init(&config.logging);

    match args.command {
        Command::List => {
            for port in SystemPorts.list_ports()? {
                println!("{port}");
            }
        }
        Command::Reset { port, mode } => {
            let reset = BootloaderReset::new(SystemPorts, SystemPorts, &config.reset);
            let attempt = reset
                .reset(&port, mode.unwrap_or(config.reset.reattach))
                .await?;
            info!(elapsed = ?attempt.elapsed, "Reset finished");
            println!("{}", attempt.resolved_port);
        }
        Command::Flash {
            programmer,
            port,
            firmware,
        } => {
            Flasher::system(&config)
                .flash_firmware(&programmer, &port, &firmware)
                .await?;
            info!("Flash complete");
        }
        Command::DumpFlash {
            programmer,
            port,
            firmware,
        } => {
            let dump = Flasher::system(&config)
                .dump_then_flash(&programmer, &port, &firmware)
                .await?;
            println!("{}", dump.display());
        }
    }

    Ok(())
}
