//! linbus-core - Shared types for Linux GPIO and SPI access
//!
//! This crate holds the pieces that the GPIO and SPI crates agree on without
//! depending on each other:
//!
//! - [`ErrorKind`] - the classification every hardware error maps to
//! - [`gpio`] - pin states, per-line configuration and its byte encoding
//! - [`spi`] - SPI mode configuration and its byte encoding
//! - [`buffer`] - length validation and fallible buffer allocation
//! - [`bus`] - the `GpioBus` / `SpiBus` traits used by applications
//!
//! # Example
//!
//! ```
//! use linbus_core::gpio::{LineConfig, PinState};
//!
//! let cfg = LineConfig::output(PinState::Active).active_low();
//! assert_eq!(LineConfig::from_bits(cfg.to_bits()), cfg);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod buffer;
pub mod bus;
pub mod error;
pub mod gpio;
pub mod spi;

pub use bus::{GpioBus, SpiBus};
pub use error::{ErrorKind, HasErrorKind};
pub use gpio::{Direction, LineConfig, Offset, PinState, Polarity};
pub use spi::{BitOrder, ClockMode, Duplex, SpiConfig};
