//! CLI command implementations
//!
//! Commands are written against the [`GpioBus`](linbus_core::GpioBus) and
//! [`SpiBus`](linbus_core::SpiBus) traits and print to any writer, so they
//! run the same on real hardware and on the in-memory buses in the tests.

pub mod gpio;
pub mod spi;

/// Boxed error type used by the commands
pub type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;
