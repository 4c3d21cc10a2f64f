//! SPI mode configuration and its byte encoding
//!
//! The mode byte packs three independent settings:
//!
//! | Bits | Meaning |
//! |------|---------|
//! | 0-1  | clock mode (CPOL/CPHA, 0-3) |
//! | 2    | LSB-first bit order |
//! | 3    | half-duplex (3-wire) |

use bitflags::bitflags;

bitflags! {
    /// SPI mode byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpiModeFlags: u8 {
        /// Clock polarity/phase selector (two bits)
        const MODE_MASK   = 0b11;
        /// Shift out the least significant bit first
        const LSB_FIRST   = 1 << 2;
        /// Share one data line for transmit and receive
        const HALF_DUPLEX = 1 << 3;
    }
}

/// The four standard SPI clock polarity/phase combinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClockMode {
    /// CPOL=0, CPHA=0
    #[default]
    Mode0 = 0,
    /// CPOL=0, CPHA=1
    Mode1 = 1,
    /// CPOL=1, CPHA=0
    Mode2 = 2,
    /// CPOL=1, CPHA=1
    Mode3 = 3,
}

impl ClockMode {
    /// Clock mode from its number; only the low two bits are used
    pub fn from_bits(bits: u8) -> Self {
        match bits & SpiModeFlags::MODE_MASK.bits() {
            1 => Self::Mode1,
            2 => Self::Mode2,
            3 => Self::Mode3,
            _ => Self::Mode0,
        }
    }

    /// Clock polarity (idle level of SCK)
    pub fn cpol(self) -> u8 {
        (self as u8 >> 1) & 1
    }

    /// Clock phase (sampling edge)
    pub fn cpha(self) -> u8 {
        self as u8 & 1
    }
}

impl TryFrom<u8> for ClockMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 3 {
            return Err(value);
        }
        Ok(Self::from_bits(value))
    }
}

/// Order in which bits of a word are shifted out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitOrder {
    /// Most significant bit first
    #[default]
    MsbFirst,
    /// Least significant bit first
    LsbFirst,
}

/// Data line usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Duplex {
    /// Separate MOSI and MISO lines
    #[default]
    Full,
    /// A single shared data line (3-wire)
    Half,
}

/// Caller-selectable SPI settings applied at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpiConfig {
    /// Clock polarity/phase
    pub clock_mode: ClockMode,
    /// Bit order
    pub bit_order: BitOrder,
    /// Full or half duplex
    pub duplex: Duplex,
}

impl SpiConfig {
    /// Configuration with the given clock mode, MSB first, full duplex
    pub fn new(clock_mode: ClockMode) -> Self {
        Self {
            clock_mode,
            ..Self::default()
        }
    }

    /// Shift the least significant bit first
    pub fn lsb_first(mut self) -> Self {
        self.bit_order = BitOrder::LsbFirst;
        self
    }

    /// Use a single shared data line
    pub fn half_duplex(mut self) -> Self {
        self.duplex = Duplex::Half;
        self
    }

    /// True for 3-wire operation
    pub fn is_half_duplex(&self) -> bool {
        self.duplex == Duplex::Half
    }

    /// Decode a mode byte; unknown bits are ignored
    pub fn from_bits(bits: u8) -> Self {
        let flags = SpiModeFlags::from_bits_truncate(bits);
        Self {
            clock_mode: ClockMode::from_bits(bits),
            bit_order: if flags.contains(SpiModeFlags::LSB_FIRST) {
                BitOrder::LsbFirst
            } else {
                BitOrder::MsbFirst
            },
            duplex: if flags.contains(SpiModeFlags::HALF_DUPLEX) {
                Duplex::Half
            } else {
                Duplex::Full
            },
        }
    }

    /// Encode as a mode byte
    pub fn to_bits(&self) -> u8 {
        let mut flags = SpiModeFlags::from_bits_truncate(self.clock_mode as u8);
        flags.set(SpiModeFlags::LSB_FIRST, self.bit_order == BitOrder::LsbFirst);
        flags.set(SpiModeFlags::HALF_DUPLEX, self.is_half_duplex());
        flags.bits()
    }
}
