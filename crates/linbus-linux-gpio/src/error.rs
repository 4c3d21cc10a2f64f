//! Error types for Linux GPIO operations

use linbus_core::buffer::LengthMismatch;
use linbus_core::{ErrorKind, HasErrorKind, Offset};
use std::collections::TryReserveError;
use thiserror::Error;

use crate::backend::BackendError;

/// Linux GPIO specific errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Line and value/configuration sequences do not line up
    #[error("GPIO argument mismatch: {0}")]
    ArgumentMismatch(#[from] LengthMismatch),

    /// A line setting was rejected while building the request
    #[error("GPIO configuration failed: {0}")]
    InvalidConfig(String),

    /// Failed to open GPIO chip
    #[error("Failed to open GPIO chip '{path}': {source}")]
    ChipOpenFailed {
        path: String,
        #[source]
        source: BackendError,
    },

    /// Failed to request GPIO lines
    #[error("Failed to request GPIO lines on '{path}': {source}")]
    LineRequestFailed {
        path: String,
        #[source]
        source: BackendError,
    },

    /// Failed to allocate a value buffer
    #[error("Failed to allocate GPIO value buffer: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// Failed to get GPIO line values
    #[error("Failed to read GPIO pin value(s): {0}")]
    GetValueFailed(#[source] BackendError),

    /// The kernel returned no valid value for a queried line
    #[error("Failed to read GPIO pin value(s): no valid value for line {line}")]
    InvalidValue { line: Offset },

    /// Failed to set GPIO line values
    #[error("Failed to write GPIO pin value(s): {0}")]
    SetValueFailed(#[source] BackendError),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// GPIO chip or device not specified
    #[error("No GPIO chip specified. Use dev=/dev/gpiochipN or gpiochip=N")]
    NoDevice,
}

impl HasErrorKind for LinuxGpioError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::ArgumentMismatch(_) => ErrorKind::ArgumentMismatch,
            Self::InvalidConfig(_) | Self::InvalidParameter(_) | Self::NoDevice => {
                ErrorKind::Configuration
            }
            Self::ChipOpenFailed { .. } | Self::LineRequestFailed { .. } => ErrorKind::DeviceOpen,
            Self::OutOfMemory(_) => ErrorKind::OutOfMemory,
            Self::GetValueFailed(_) | Self::InvalidValue { .. } | Self::SetValueFailed(_) => {
                ErrorKind::Io
            }
        }
    }
}

/// Result type for Linux GPIO operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;
