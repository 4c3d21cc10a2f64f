//! [`SpiBus`] implementation on top of a spidev device

use crate::device::{LinuxSpiConfig, SpiDevice};
use crate::error::{LinuxSpiError, Result};

use linbus_core::SpiBus;

/// SPI bus backed by one spidev node
#[derive(Debug)]
pub struct LinuxSpiBus {
    device: SpiDevice,
    half_duplex: bool,
}

impl LinuxSpiBus {
    /// Open and configure the device
    pub fn setup(config: &LinuxSpiConfig) -> Result<Self> {
        let device = SpiDevice::open(config)?;
        Ok(Self {
            device,
            half_duplex: config.mode.is_half_duplex(),
        })
    }

    /// Close the underlying device
    pub fn close(self) -> Result<()> {
        self.device.close()
    }
}

/// Reject a transaction that would transmit and receive at the same time on
/// a 3-wire bus
pub fn check_half_duplex(half_duplex: bool, out_len: usize, in_len: usize) -> Result<()> {
    if half_duplex && out_len > 0 && in_len > 0 {
        return Err(LinuxSpiError::HalfDuplexConflict { out_len, in_len });
    }
    Ok(())
}

impl SpiBus for LinuxSpiBus {
    type Error = LinuxSpiError;

    fn spi_transaction(&mut self, out: Option<&[u8]>, in_len: usize, chunked: bool) -> Result<Vec<u8>> {
        check_half_duplex(self.half_duplex, out.map_or(0, <[u8]>::len), in_len)?;
        self.device.transfer(out, in_len, chunked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linbus_core::{ErrorKind, HasErrorKind};

    #[test]
    fn test_check_half_duplex() {
        assert!(check_half_duplex(false, 4, 4).is_ok());
        assert!(check_half_duplex(true, 4, 0).is_ok());
        assert!(check_half_duplex(true, 0, 4).is_ok());

        let err = check_half_duplex(true, 4, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentMismatch);
    }
}
