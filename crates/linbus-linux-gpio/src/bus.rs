//! [`GpioBus`] implementation on top of a line request

use crate::backend::{GpioBackend, Gpiocdev};
use crate::config::LinuxGpioConfig;
use crate::device::GpioLineRequest;
use crate::error::{LinuxGpioError, Result};

use linbus_core::{GpioBus, LineConfig, Offset, PinState};

use std::collections::BTreeMap;

/// GPIO bus backed by a single line request
pub struct LinuxGpioBus<B: GpioBackend = Gpiocdev> {
    request: GpioLineRequest<B>,
}

impl LinuxGpioBus<Gpiocdev> {
    /// Request the configured lines
    pub fn setup(config: &LinuxGpioConfig) -> Result<Self> {
        Self::setup_with(&Gpiocdev, config)
    }
}

impl<B: GpioBackend> LinuxGpioBus<B> {
    /// Request the configured lines, in ascending line order, through `backend`
    pub fn setup_with(backend: &B, config: &LinuxGpioConfig) -> Result<Self> {
        let mut lines = config.lines.clone();
        lines.sort_by_key(|(line, _)| *line);
        let (offsets, configs): (Vec<Offset>, Vec<LineConfig>) = lines.into_iter().unzip();

        let request =
            GpioLineRequest::open_with(backend, &config.device, &config.consumer, &offsets, &configs)?;
        Ok(Self { request })
    }

    /// Release the lines
    pub fn close(self) {
        self.request.close();
    }
}

impl<B: GpioBackend> GpioBus for LinuxGpioBus<B> {
    type Error = LinuxGpioError;

    fn gpio_get(&mut self, lines: &[Offset]) -> Result<Vec<PinState>> {
        self.request.get(lines)
    }

    fn gpio_set(&mut self, state: &BTreeMap<Offset, PinState>) -> Result<()> {
        let lines: Vec<Offset> = state.keys().copied().collect();
        let values: Vec<PinState> = state.values().copied().collect();
        self.request.set(&lines, &values)
    }
}
