//! linbus-linux-gpio - Linux GPIO line requests
//!
//! This crate requests a fixed set of GPIO lines from one chip and reads or
//! drives any subset of them with a single batched call, using the Linux
//! GPIO character device through the gpiocdev crate.
//!
//! # Example
//!
//! ```no_run
//! use linbus_core::{LineConfig, PinState};
//! use linbus_linux_gpio::GpioLineRequest;
//!
//! let mut req = GpioLineRequest::open(
//!     "/dev/gpiochip0",
//!     "linbus",
//!     &[17, 27, 22],
//!     &[
//!         LineConfig::output(PinState::Inactive),
//!         LineConfig::output(PinState::Active).active_low(),
//!         LineConfig::input().active_low(),
//!     ],
//! )?;
//!
//! req.set(&[17], &[PinState::Active])?;
//! let busy = req.get(&[22])?;
//! println!("busy: {}", busy[0]);
//! req.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support (kernel 5.10+ for v2 API)
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod backend;
pub mod bus;
pub mod config;
pub mod device;
pub mod error;

// Re-exports
pub use backend::{GpioBackend, Gpiocdev, LineValues};
pub use bus::LinuxGpioBus;
pub use config::{parse_options, LinuxGpioConfig};
pub use device::GpioLineRequest;
pub use error::{LinuxGpioError, Result};

/// Open a GPIO bus from `key=value` bus options
///
/// This is a convenience function for use in the CLI.
///
/// # Example Options
///
/// - `dev=/dev/gpiochip0` - GPIO chip device path (or use gpiochip=N)
/// - `out=17:active` - output line with initial value
/// - `in=22:low` - active-low input line
pub fn open_linux_gpio(options: &[(&str, &str)]) -> Result<LinuxGpioBus> {
    let config = parse_options(options)?;
    LinuxGpioBus::setup(&config)
}
