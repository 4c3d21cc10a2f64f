//! Application-facing bus traits
//!
//! A display or sensor driver talks to its hardware through these traits
//! rather than through a concrete Linux device, so it can run against an
//! in-memory implementation in tests.

use crate::buffer::LengthMismatch;
use crate::error::HasErrorKind;
use crate::gpio::{Offset, PinState};
use std::collections::BTreeMap;

/// A set of requested GPIO lines
pub trait GpioBus {
    /// Error type of the implementation
    type Error: std::error::Error + HasErrorKind + From<LengthMismatch> + 'static;

    /// Read the state of each line in `lines`, in the same order
    fn gpio_get(&mut self, lines: &[Offset]) -> Result<Vec<PinState>, Self::Error>;

    /// Drive every line in `state` to its mapped value with one update
    fn gpio_set(&mut self, state: &BTreeMap<Offset, PinState>) -> Result<(), Self::Error>;

    /// Read a single line
    fn gpio_get_one(&mut self, line: Offset) -> Result<PinState, Self::Error> {
        let values = self.gpio_get(&[line])?;
        match values.as_slice() {
            [state] => Ok(*state),
            _ => Err(LengthMismatch {
                what: "GPIO states returned for one requested line",
                left: values.len(),
                right: 1,
            }
            .into()),
        }
    }

    /// Drive a single line
    fn gpio_set_one(&mut self, line: Offset, state: PinState) -> Result<(), Self::Error> {
        self.gpio_set(&BTreeMap::from([(line, state)]))
    }
}

/// An open SPI device
pub trait SpiBus {
    /// Error type of the implementation
    type Error: std::error::Error + HasErrorKind + 'static;

    /// Transmit `out` (if any) and receive `in_len` bytes (if non-zero)
    ///
    /// When `chunked` is set the transfer is split so no single kernel
    /// request exceeds the driver's buffer size.
    fn spi_transaction(
        &mut self,
        out: Option<&[u8]>,
        in_len: usize,
        chunked: bool,
    ) -> Result<Vec<u8>, Self::Error>;

    /// Receive `count` bytes
    fn spi_read(&mut self, count: usize) -> Result<Vec<u8>, Self::Error> {
        self.spi_transaction(None, count, false)
    }

    /// Transmit `data`
    fn spi_write(&mut self, data: &[u8], chunked: bool) -> Result<(), Self::Error> {
        self.spi_transaction(Some(data), 0, chunked).map(|_| ())
    }

    /// Transmit a single byte
    fn spi_write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.spi_write(&[byte], false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug, thiserror::Error)]
    #[error(transparent)]
    struct Short(#[from] LengthMismatch);

    impl HasErrorKind for Short {
        fn kind(&self) -> ErrorKind {
            ErrorKind::ArgumentMismatch
        }
    }

    /// Returns `reply` for every read, whatever was asked
    struct FixedReply {
        reply: Vec<PinState>,
    }

    impl GpioBus for FixedReply {
        type Error = Short;

        fn gpio_get(&mut self, _lines: &[Offset]) -> Result<Vec<PinState>, Short> {
            Ok(self.reply.clone())
        }

        fn gpio_set(&mut self, _state: &BTreeMap<Offset, PinState>) -> Result<(), Short> {
            Ok(())
        }
    }

    #[test]
    fn test_gpio_get_one() {
        let mut bus = FixedReply {
            reply: vec![PinState::Active],
        };
        assert_eq!(bus.gpio_get_one(3).unwrap(), PinState::Active);
    }

    #[test]
    fn test_gpio_get_one_rejects_wrong_count() {
        let mut bus = FixedReply { reply: vec![] };
        let err = bus.gpio_get_one(3).unwrap_err();
        assert_eq!(err.0.left, 0);
        assert_eq!(err.kind(), ErrorKind::ArgumentMismatch);

        let mut bus = FixedReply {
            reply: vec![PinState::Active, PinState::Inactive],
        };
        assert!(bus.gpio_get_one(3).is_err());
    }
}
