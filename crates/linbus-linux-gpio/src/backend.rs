//! Line request backends
//!
//! [`GpioLineRequest`](crate::GpioLineRequest) drives the kernel through the
//! [`GpioBackend`] and [`LineValues`] traits. [`Gpiocdev`] is the real
//! implementation on top of the GPIO character device; tests substitute an
//! in-memory chip.

use gpiocdev::chip::Chip;
use gpiocdev::line::{Offset, Value, Values};
use gpiocdev::request::{Config, Request};

use linbus_core::{Direction, LineConfig, PinState};

use std::path::{Path, PathBuf};

/// Error reported by a backend
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One staging slot per line; `None` means the kernel reported no valid value
pub type LineSlot = Option<Value>;

/// Opens chips and requests lines on them
pub trait GpioBackend {
    /// An open chip
    type Chip;
    /// A granted line request
    type Request: LineValues;

    /// Open the chip device node at `path`
    fn open_chip(&self, path: &Path) -> Result<Self::Chip, BackendError>;

    /// Request all `lines` on `chip` at once, tagged with `consumer`
    fn request_lines(
        &self,
        chip: &Self::Chip,
        consumer: &str,
        lines: &[(Offset, LineConfig)],
    ) -> Result<Self::Request, BackendError>;
}

/// Batched access to the values of requested lines
pub trait LineValues {
    /// Read `lines` into the matching positions of `slots`
    ///
    /// `slots` has the same length as `lines`.
    fn read_subset(&self, lines: &[Offset], slots: &mut [LineSlot]) -> Result<(), BackendError>;

    /// Write `slots` to the matching `lines`; `None` slots are skipped
    fn write_subset(&self, lines: &[Offset], slots: &[LineSlot]) -> Result<(), BackendError>;
}

/// Convert a logical pin state to a gpiocdev value
pub fn to_value(state: PinState) -> Value {
    match state {
        PinState::Active => Value::Active,
        PinState::Inactive => Value::Inactive,
    }
}

/// Convert a gpiocdev value to a logical pin state
pub fn from_value(value: Value) -> PinState {
    PinState::from(value == Value::Active)
}

/// Backend using the GPIO character device through gpiocdev
#[derive(Debug, Clone, Copy, Default)]
pub struct Gpiocdev;

/// Chip opened by [`Gpiocdev`]
///
/// gpiocdev requests lines by path, so the line request does not go through
/// this handle. Holding it open makes a missing or inaccessible chip fail
/// in `open_chip` as a device-open error, separately from a rejected line
/// request, and keeps the chip open for as long as the request lives.
pub struct GpiocdevChip {
    _chip: Chip,
    path: PathBuf,
}

impl GpiocdevChip {
    /// Device node this chip was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GpioBackend for Gpiocdev {
    type Chip = GpiocdevChip;
    type Request = Request;

    fn open_chip(&self, path: &Path) -> Result<Self::Chip, BackendError> {
        let chip = Chip::from_path(path)?;
        Ok(GpiocdevChip {
            _chip: chip,
            path: path.to_path_buf(),
        })
    }

    fn request_lines(
        &self,
        chip: &Self::Chip,
        consumer: &str,
        lines: &[(Offset, LineConfig)],
    ) -> Result<Self::Request, BackendError> {
        let mut req_config = Config::default();
        for (offset, cfg) in lines {
            let line = req_config.with_line(*offset);
            if cfg.is_active_low() {
                line.as_active_low();
            } else {
                line.as_active_high();
            }
            match cfg.direction {
                Direction::Output => line.as_output(to_value(cfg.initial)),
                Direction::Input => line.as_input(),
            };
        }

        let request = Request::from_config(req_config)
            .on_chip(chip.path())
            .with_consumer(consumer)
            .request()?;
        Ok(request)
    }
}

impl LineValues for Request {
    fn read_subset(&self, lines: &[Offset], slots: &mut [LineSlot]) -> Result<(), BackendError> {
        let mut values = Values::from_offsets(lines);
        self.values(&mut values)?;
        for (slot, line) in slots.iter_mut().zip(lines) {
            *slot = values.get(*line);
        }
        Ok(())
    }

    fn write_subset(&self, lines: &[Offset], slots: &[LineSlot]) -> Result<(), BackendError> {
        let mut values = Values::default();
        for (line, slot) in lines.iter().zip(slots) {
            if let Some(value) = slot {
                values.set(*line, *value);
            }
        }
        self.set_values(&values)?;
        Ok(())
    }
}
