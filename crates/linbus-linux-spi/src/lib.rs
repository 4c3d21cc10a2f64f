//! linbus-linux-spi - Linux spidev transfers
//!
//! This crate opens `/dev/spidevX.Y` nodes and performs transfers of any
//! length, full or half duplex, optionally split so that no single kernel
//! message exceeds the spidev buffer size.
//!
//! # Overview
//!
//! - [`SpiDevice`] applies mode, speed and word size at open time and runs
//!   transfers.
//! - [`plan`] decides how each kernel message is made up: at most two
//!   descriptors, never more bytes than the chunk limit.
//! - [`chunk`] reads the spidev `bufsiz` parameter once per process.
//! - [`LinuxSpiBus`] implements [`linbus_core::SpiBus`] and guards 3-wire
//!   buses against simultaneous transmit and receive.
//!
//! # Example
//!
//! ```no_run
//! use linbus_core::{ClockMode, SpiConfig};
//! use linbus_linux_spi::{LinuxSpiConfig, SpiDevice};
//!
//! let config = LinuxSpiConfig::new("/dev/spidev0.0")
//!     .with_speed(6_000_000)
//!     .with_mode(SpiConfig::new(ClockMode::Mode0));
//! let mut spi = SpiDevice::open(&config)?;
//!
//! // Send a command byte, then read three bytes back
//! let id = spi.transfer(Some(&[0x9F]), 4, false)?;
//! println!("ID: {:02X?}", &id[1..]);
//!
//! // Stream a large buffer in driver-sized pieces
//! spi.transfer(Some(&vec![0xFF; 64 * 1024]), 0, true)?;
//! spi.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y` device
//! - Readable `/sys/module/spidev/parameters/bufsiz`

pub mod bus;
pub mod chunk;
pub mod device;
pub mod error;
pub mod plan;
pub mod transfer;

// Re-exports
pub use bus::LinuxSpiBus;
pub use chunk::chunk_limit;
pub use device::{
    close_raw, configure, parse_options, LinuxSpiConfig, SpiDevice, SpiSetup, DEFAULT_SPEED_HZ,
};
pub use error::{LinuxSpiError, Result};

/// Open a Linux SPI bus from `key=value` bus options
///
/// This is a convenience function for use in the CLI.
///
/// # Example Options
///
/// - `dev=/dev/spidev0.0` - Required: device path
/// - `spispeed=4000` - Optional: speed in kHz (default: 2000)
/// - `mode=0` - Optional: SPI mode 0-3 (default: 0)
/// - `lsb=yes`, `3wire=yes` - Optional: bit order and duplex
pub fn open_linux_spi(options: &[(&str, &str)]) -> Result<LinuxSpiBus> {
    let config = parse_options(options)?;
    LinuxSpiBus::setup(&config)
}
