//! Error classification shared by the GPIO and SPI crates
//!
//! Each hardware crate has its own error enum carrying the details (paths,
//! settings, OS errors). Every variant of those enums maps to one of the
//! kinds defined here, so callers can react to a failure class without
//! matching on crate-specific variants.

use core::fmt;

/// Failure classes reported by the hardware access layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Device node missing, permission denied or already in use
    DeviceOpen,
    /// The driver rejected a mode, speed or line setting
    Configuration,
    /// Caller-supplied sequences have inconsistent lengths
    ArgumentMismatch,
    /// A transfer, value query/update or close failed at the kernel level
    Io,
    /// An allocation failed
    OutOfMemory,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceOpen => write!(f, "device open error"),
            Self::Configuration => write!(f, "configuration error"),
            Self::ArgumentMismatch => write!(f, "argument mismatch"),
            Self::Io => write!(f, "I/O error"),
            Self::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

/// Implemented by every error type of the hardware crates
pub trait HasErrorKind {
    /// Classify this error
    fn kind(&self) -> ErrorKind;
}
