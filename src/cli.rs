//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "linbus")]
#[command(author, version, about = "Linux GPIO line and SPI bus access", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Bus description file (TOML) with [gpio] and/or [spi] sections
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// GPIO line operations
    #[command(subcommand)]
    Gpio(GpioCommands),

    /// SPI bus operations
    #[command(subcommand)]
    Spi(SpiCommands),
}

#[derive(Subcommand)]
pub enum GpioCommands {
    /// Read line states
    Get {
        /// Bus options, e.g. dev=/dev/gpiochip0,in=22,in=23:low
        #[arg(short, long)]
        dev: Option<String>,

        /// Lines to read
        #[arg(required = true)]
        lines: Vec<u32>,
    },

    /// Drive output lines
    Set {
        /// Bus options, e.g. dev=/dev/gpiochip0,out=17,out=27:low
        #[arg(short, long)]
        dev: Option<String>,

        /// Assignments of the form LINE=VALUE (VALUE: 1, 0, active, inactive)
        #[arg(required = true)]
        assignments: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum SpiCommands {
    /// Receive bytes
    Read {
        /// Bus options, e.g. dev=/dev/spidev0.0,spispeed=1000,mode=0
        #[arg(short, long)]
        dev: Option<String>,

        /// Number of bytes to receive
        count: usize,
    },

    /// Transmit bytes
    Write {
        /// Bus options, e.g. dev=/dev/spidev0.0,spispeed=1000,mode=0
        #[arg(short, long)]
        dev: Option<String>,

        /// Hex bytes to send (e.g. "9f00ff")
        #[arg(required_unless_present = "file")]
        data: Option<String>,

        /// Send the contents of a file instead
        #[arg(short, long, conflicts_with = "data")]
        file: Option<PathBuf>,

        /// Split into spidev buffer-sized messages
        #[arg(long)]
        chunked: bool,
    },

    /// Transmit and receive in one transaction
    Xfer {
        /// Bus options, e.g. dev=/dev/spidev0.0,spispeed=1000,mode=0
        #[arg(short, long)]
        dev: Option<String>,

        /// Hex bytes to send
        data: String,

        /// Number of bytes to receive
        #[arg(short, long, default_value_t = 0)]
        read: usize,

        /// Split into spidev buffer-sized messages
        #[arg(long)]
        chunked: bool,
    },
}
