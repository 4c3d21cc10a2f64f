//! Error types for Linux SPI operations

use linbus_core::{ErrorKind, HasErrorKind};
use std::collections::TryReserveError;
use thiserror::Error;

/// Linux SPI specific errors
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set SPI mode
    #[error("Failed to set SPI mode of {path} to {mode:#x}: {source}")]
    SetModeFailed {
        path: String,
        mode: u32,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set clock speed
    #[error("Failed to set SPI speed of {path} to {speed} Hz: {source}")]
    SetSpeedFailed {
        path: String,
        speed: u32,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set bits per word
    #[error("Failed to set SPI word size of {path} to {bits}: {source}")]
    SetBitsPerWordFailed {
        path: String,
        bits: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read kernel buffer size
    #[error("Failed to read spidev bufsiz from {path}: {source}")]
    BufferSizeReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Kernel buffer size is not a usable number
    #[error("Failed to parse spidev bufsiz: {0:?}")]
    InvalidBufferSize(String),

    /// Failed to allocate the receive buffer
    #[error("Failed to allocate SPI receive buffer: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// SPI transfer failed
    #[error("Failed to perform SPI transfer: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// Closing the device failed
    #[error("Failed to close SPI device: {0}")]
    CloseFailed(#[source] std::io::Error),

    /// Both transfer legs were requested on a 3-wire bus
    #[error("Half-duplex SPI cannot transmit {out_len} and receive {in_len} bytes at once")]
    HalfDuplexConflict { out_len: usize, in_len: usize },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Device not specified
    #[error("No device specified. Use dev=/dev/spidevX.Y")]
    NoDevice,
}

impl HasErrorKind for LinuxSpiError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::OpenFailed { .. } => ErrorKind::DeviceOpen,
            Self::SetModeFailed { .. }
            | Self::SetSpeedFailed { .. }
            | Self::SetBitsPerWordFailed { .. }
            | Self::BufferSizeReadFailed { .. }
            | Self::InvalidBufferSize(_)
            | Self::InvalidParameter(_)
            | Self::NoDevice => ErrorKind::Configuration,
            Self::OutOfMemory(_) => ErrorKind::OutOfMemory,
            Self::TransferFailed(_) | Self::CloseFailed(_) => ErrorKind::Io,
            Self::HalfDuplexConflict { .. } => ErrorKind::ArgumentMismatch,
        }
    }
}

/// Result type for Linux SPI operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;
