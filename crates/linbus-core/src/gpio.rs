//! GPIO line types and their byte encoding
//!
//! A line request is configured with one [`LineConfig`] per line. On the
//! wire between an application and this layer each configuration is a
//! single byte built from disjoint bit masks (see [`LineFlags`]), and each
//! pin state is a single byte where only bit 0 is significant.

use bitflags::bitflags;
use core::fmt;
use core::str::FromStr;

/// Chip-local GPIO line number
pub type Offset = u32;

bitflags! {
    /// Per-line configuration byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LineFlags: u8 {
        /// Initial output value is active (ignored for inputs)
        const STATE_ACTIVE = 1 << 0;
        /// Line is an output
        const DIR_OUT      = 1 << 1;
        /// Line is active-low
        const ACTIVE_LOW   = 1 << 2;
    }
}

/// Mask of the significant bit in a pin state byte
pub const PIN_STATE_MASK: u8 = LineFlags::STATE_ACTIVE.bits();

/// Logical state of a line, independent of its electrical polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PinState {
    /// Line is not asserted
    #[default]
    Inactive,
    /// Line is asserted
    Active,
}

impl PinState {
    /// Decode a pin state byte; only bit 0 is looked at
    pub fn from_byte(b: u8) -> Self {
        if b & PIN_STATE_MASK != 0 {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    /// Encode as a pin state byte
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Inactive => 0,
            Self::Active => PIN_STATE_MASK,
        }
    }

    /// True if the line is asserted
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

impl From<bool> for PinState {
    fn from(active: bool) -> Self {
        if active {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Error returned when a pin state string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pin state '{0}' (expected 1, 0, active or inactive)")]
pub struct ParsePinStateError(pub String);

impl FromStr for PinState {
    type Err = ParsePinStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "active" | "on" => Ok(Self::Active),
            "0" | "inactive" | "off" => Ok(Self::Inactive),
            _ => Err(ParsePinStateError(s.to_string())),
        }
    }
}

/// Line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Line is read
    #[default]
    Input,
    /// Line is driven
    Output,
}

/// Mapping between logical and electrical level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Polarity {
    /// Active means electrically high
    #[default]
    ActiveHigh,
    /// Active means electrically low
    ActiveLow,
}

/// Configuration of a single requested line
///
/// `initial` only matters for outputs; it is still carried for inputs so
/// that a configuration byte round-trips unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineConfig {
    /// Input or output
    pub direction: Direction,
    /// Active-high or active-low
    pub polarity: Polarity,
    /// Value driven when the request is made (outputs only)
    pub initial: PinState,
}

impl LineConfig {
    /// An active-high input
    pub fn input() -> Self {
        Self::default()
    }

    /// An active-high output driven to `initial` at request time
    pub fn output(initial: PinState) -> Self {
        Self {
            direction: Direction::Output,
            initial,
            ..Self::default()
        }
    }

    /// Make the line active-low
    pub fn active_low(mut self) -> Self {
        self.polarity = Polarity::ActiveLow;
        self
    }

    /// Make the line active-high
    pub fn active_high(mut self) -> Self {
        self.polarity = Polarity::ActiveHigh;
        self
    }

    /// True for output lines
    pub fn is_output(&self) -> bool {
        self.direction == Direction::Output
    }

    /// True for active-low lines
    pub fn is_active_low(&self) -> bool {
        self.polarity == Polarity::ActiveLow
    }

    /// Decode a configuration byte; unknown bits are ignored
    pub fn from_bits(bits: u8) -> Self {
        let flags = LineFlags::from_bits_truncate(bits);
        Self {
            direction: if flags.contains(LineFlags::DIR_OUT) {
                Direction::Output
            } else {
                Direction::Input
            },
            polarity: if flags.contains(LineFlags::ACTIVE_LOW) {
                Polarity::ActiveLow
            } else {
                Polarity::ActiveHigh
            },
            initial: PinState::from(flags.contains(LineFlags::STATE_ACTIVE)),
        }
    }

    /// Encode as a configuration byte
    pub fn to_bits(&self) -> u8 {
        let mut flags = LineFlags::empty();
        flags.set(LineFlags::STATE_ACTIVE, self.initial.is_active());
        flags.set(LineFlags::DIR_OUT, self.is_output());
        flags.set(LineFlags::ACTIVE_LOW, self.is_active_low());
        flags.bits()
    }
}
