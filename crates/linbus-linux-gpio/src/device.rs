//! GPIO line request lifecycle
//!
//! A [`GpioLineRequest`] owns an open chip, the kernel-side request for a
//! fixed set of lines, and a staging buffer with one slot per requested
//! line. Every [`get`](GpioLineRequest::get) and
//! [`set`](GpioLineRequest::set) addresses lines by number, not by their
//! position in the original request, and stages values in that buffer.
//!
//! Dropping (or [`close`](GpioLineRequest::close)-ing) the handle releases
//! the line request first, then the chip, then the buffer.

use crate::backend::{from_value, to_value, GpioBackend, Gpiocdev, LineSlot, LineValues};
use crate::error::{LinuxGpioError, Result};

use linbus_core::buffer::{check_equal_len, check_within, try_alloc, try_with_capacity};
use linbus_core::{LineConfig, Offset, PinState};

use std::collections::HashSet;
use std::path::Path;

/// A granted request for a set of GPIO lines
pub struct GpioLineRequest<B: GpioBackend = Gpiocdev> {
    // Field order is release order.
    request: B::Request,
    _chip: B::Chip,
    values: Vec<LineSlot>,
}

impl GpioLineRequest<Gpiocdev> {
    /// Request `lines` on the chip at `device`, configuring `lines[i]` with
    /// `configs[i]`
    pub fn open(
        device: impl AsRef<Path>,
        consumer: &str,
        lines: &[Offset],
        configs: &[LineConfig],
    ) -> Result<Self> {
        Self::open_with(&Gpiocdev, device, consumer, lines, configs)
    }
}

impl<B: GpioBackend> GpioLineRequest<B> {
    /// Same as [`open`](GpioLineRequest::open) with an explicit backend
    pub fn open_with(
        backend: &B,
        device: impl AsRef<Path>,
        consumer: &str,
        lines: &[Offset],
        configs: &[LineConfig],
    ) -> Result<Self> {
        let device = device.as_ref();
        check_equal_len(
            "GPIO pin and configuration arrays lengths differ",
            lines.len(),
            configs.len(),
        )?;

        let settings = line_settings(lines, configs)?;

        log::debug!(
            "linux_gpio: Opening {} for {} line(s)",
            device.display(),
            lines.len()
        );

        let chip = backend
            .open_chip(device)
            .map_err(|e| LinuxGpioError::ChipOpenFailed {
                path: device.display().to_string(),
                source: e,
            })?;

        // On any error below `chip` is dropped before returning.
        let values = try_alloc(lines.len(), None)?;

        let request = backend
            .request_lines(&chip, consumer, &settings)
            .map_err(|e| LinuxGpioError::LineRequestFailed {
                path: device.display().to_string(),
                source: e,
            })?;

        log::info!(
            "linux_gpio: Requested lines {:?} on {} as '{}'",
            lines,
            device.display(),
            consumer
        );

        Ok(Self {
            request,
            _chip: chip,
            values,
        })
    }

    /// Number of lines this request was opened with
    pub fn line_count(&self) -> usize {
        self.values.len()
    }

    /// Read the current state of `lines`
    ///
    /// `lines` may be any subset of the requested lines, in any order; the
    /// result is in the same order. If the kernel reports no valid value for
    /// any line the whole call fails.
    pub fn get(&mut self, lines: &[Offset]) -> Result<Vec<PinState>> {
        check_within(
            "invalid GPIO line count: requested lines of",
            lines.len(),
            self.values.len(),
        )?;

        let slots = &mut self.values[..lines.len()];
        slots.fill(None);
        self.request
            .read_subset(lines, slots)
            .map_err(LinuxGpioError::GetValueFailed)?;

        if let Some(pos) = slots.iter().position(Option::is_none) {
            return Err(LinuxGpioError::InvalidValue { line: lines[pos] });
        }

        let mut states = try_with_capacity(lines.len())?;
        states.extend(slots.iter().flatten().map(|v| from_value(*v)));
        Ok(states)
    }

    /// Drive `lines[i]` to `values[i]` with one batched update
    ///
    /// The staging buffer keeps the new values even if the kernel rejects
    /// the write.
    pub fn set(&mut self, lines: &[Offset], values: &[PinState]) -> Result<()> {
        check_equal_len(
            "GPIO pin and value arrays lengths differ",
            lines.len(),
            values.len(),
        )?;
        check_within(
            "invalid GPIO line count: requested lines of",
            lines.len(),
            self.values.len(),
        )?;

        let slots = &mut self.values[..lines.len()];
        for (slot, state) in slots.iter_mut().zip(values) {
            *slot = Some(to_value(*state));
        }
        self.request
            .write_subset(lines, slots)
            .map_err(LinuxGpioError::SetValueFailed)
    }

    /// Release the line request and the chip
    pub fn close(self) {
        log::debug!("linux_gpio: Releasing {} line(s)", self.values.len());
        drop(self);
    }
}

/// Build the per-line settings for a request
///
/// A line may only be configured once per request.
fn line_settings(lines: &[Offset], configs: &[LineConfig]) -> Result<Vec<(Offset, LineConfig)>> {
    let mut seen = HashSet::with_capacity(lines.len());
    let mut settings = try_with_capacity(lines.len())?;
    for (&line, &cfg) in lines.iter().zip(configs) {
        if !seen.insert(line) {
            return Err(LinuxGpioError::InvalidConfig(format!(
                "line {} configured more than once",
                line
            )));
        }
        settings.push((line, cfg));
    }
    Ok(settings)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::backend::BackendError;
    use gpiocdev::line::Value;
    use linbus_core::{ErrorKind, HasErrorKind};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::rc::Rc;

    /// Observable state of the in-memory chip
    #[derive(Default)]
    pub(crate) struct ChipState {
        pub open_chips: usize,
        pub live_requests: usize,
        pub released: Vec<&'static str>,
        pub requested: Vec<(Offset, LineConfig)>,
        pub consumer: String,
        pub levels: HashMap<Offset, Value>,
        pub invalid: HashSet<Offset>,
        pub reads: Vec<Vec<Offset>>,
        pub writes: Vec<Vec<(Offset, Value)>>,
        pub fail_open: bool,
        pub fail_request: bool,
        pub fail_write: bool,
    }

    #[derive(Clone, Default)]
    pub(crate) struct MockBackend(pub Rc<RefCell<ChipState>>);

    pub(crate) struct MockChip(Rc<RefCell<ChipState>>);

    impl Drop for MockChip {
        fn drop(&mut self) {
            let mut st = self.0.borrow_mut();
            st.open_chips -= 1;
            st.released.push("chip");
        }
    }

    pub(crate) struct MockRequest(Rc<RefCell<ChipState>>);

    impl Drop for MockRequest {
        fn drop(&mut self) {
            let mut st = self.0.borrow_mut();
            st.live_requests -= 1;
            st.released.push("request");
        }
    }

    impl GpioBackend for MockBackend {
        type Chip = MockChip;
        type Request = MockRequest;

        fn open_chip(&self, path: &Path) -> std::result::Result<MockChip, BackendError> {
            let mut st = self.0.borrow_mut();
            if st.fail_open {
                return Err(format!("{}: no such device", path.display()).into());
            }
            st.open_chips += 1;
            Ok(MockChip(self.0.clone()))
        }

        fn request_lines(
            &self,
            _chip: &MockChip,
            consumer: &str,
            lines: &[(Offset, LineConfig)],
        ) -> std::result::Result<MockRequest, BackendError> {
            let mut st = self.0.borrow_mut();
            if st.fail_request {
                return Err("device or resource busy".into());
            }
            st.live_requests += 1;
            st.consumer = consumer.to_string();
            st.requested = lines.to_vec();
            for (line, cfg) in lines {
                st.levels.insert(*line, to_value(cfg.initial));
            }
            Ok(MockRequest(self.0.clone()))
        }
    }

    impl LineValues for MockRequest {
        fn read_subset(
            &self,
            lines: &[Offset],
            slots: &mut [LineSlot],
        ) -> std::result::Result<(), BackendError> {
            let mut st = self.0.borrow_mut();
            st.reads.push(lines.to_vec());
            for (slot, line) in slots.iter_mut().zip(lines) {
                *slot = if st.invalid.contains(line) {
                    None
                } else {
                    st.levels.get(line).copied()
                };
            }
            Ok(())
        }

        fn write_subset(
            &self,
            lines: &[Offset],
            slots: &[LineSlot],
        ) -> std::result::Result<(), BackendError> {
            let mut st = self.0.borrow_mut();
            if st.fail_write {
                return Err("operation not permitted".into());
            }
            let mut batch = Vec::new();
            for (line, slot) in lines.iter().zip(slots) {
                if let Some(v) = slot {
                    st.levels.insert(*line, *v);
                    batch.push((*line, *v));
                }
            }
            st.writes.push(batch);
            Ok(())
        }
    }

    fn chip_path() -> PathBuf {
        PathBuf::from("/dev/gpiochip0")
    }

    fn open_three(backend: &MockBackend) -> GpioLineRequest<MockBackend> {
        GpioLineRequest::open_with(
            backend,
            chip_path(),
            "linbus-test",
            &[17, 4, 22],
            &[
                LineConfig::output(PinState::Active),
                LineConfig::output(PinState::Inactive).active_low(),
                LineConfig::input(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_open_requests_all_lines() {
        let backend = MockBackend::default();
        let req = open_three(&backend);
        assert_eq!(req.line_count(), 3);

        let st = backend.0.borrow();
        assert_eq!(st.consumer, "linbus-test");
        assert_eq!(st.requested.len(), 3);
        assert_eq!(st.requested[1].0, 4);
        assert!(st.requested[1].1.is_active_low());
        assert_eq!(st.open_chips, 1);
        assert_eq!(st.live_requests, 1);
    }

    #[test]
    fn test_open_close_cycles_do_not_leak() {
        let backend = MockBackend::default();
        for _ in 0..50 {
            let req = open_three(&backend);
            req.close();
        }
        let st = backend.0.borrow();
        assert_eq!(st.open_chips, 0);
        assert_eq!(st.live_requests, 0);
        assert_eq!(st.released.len(), 100);
        // Request is always released before the chip
        assert!(st.released.chunks(2).all(|c| c == ["request", "chip"]));
    }

    #[test]
    fn test_argument_mismatch_only_on_length_difference() {
        let backend = MockBackend::default();
        let err = GpioLineRequest::open_with(
            &backend,
            chip_path(),
            "t",
            &[1, 2, 3],
            &[LineConfig::input(), LineConfig::input()],
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::ArgumentMismatch);
        assert!(err.to_string().contains("3 and 2"));
        // Nothing was opened
        assert_eq!(backend.0.borrow().open_chips, 0);

        let ok = GpioLineRequest::open_with(&backend, chip_path(), "t", &[1, 2], &[LineConfig::input(); 2]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_duplicate_line_is_configuration_error() {
        let backend = MockBackend::default();
        let err = GpioLineRequest::open_with(
            &backend,
            chip_path(),
            "t",
            &[5, 5],
            &[LineConfig::input(); 2],
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(backend.0.borrow().open_chips, 0);
    }

    #[test]
    fn test_chip_open_failure() {
        let backend = MockBackend::default();
        backend.0.borrow_mut().fail_open = true;
        let err = GpioLineRequest::open_with(&backend, chip_path(), "t", &[1], &[LineConfig::input()])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::DeviceOpen);
        assert!(err.to_string().contains("/dev/gpiochip0"));
    }

    #[test]
    fn test_request_failure_releases_chip() {
        let backend = MockBackend::default();
        backend.0.borrow_mut().fail_request = true;
        let err = GpioLineRequest::open_with(&backend, chip_path(), "t", &[1], &[LineConfig::input()])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::DeviceOpen);
        let st = backend.0.borrow();
        assert_eq!(st.open_chips, 0);
        assert_eq!(st.released, ["chip"]);
    }

    #[test]
    fn test_get_addresses_lines_by_number() {
        let backend = MockBackend::default();
        let mut req = open_three(&backend);

        // Reverse of the request order, and a subset
        let states = req.get(&[22, 17]).unwrap();
        assert_eq!(states, [PinState::Inactive, PinState::Active]);
        assert_eq!(backend.0.borrow().reads.last().unwrap(), &[22, 17]);

        let states = req.get(&[4]).unwrap();
        assert_eq!(states, [PinState::Inactive]);

        assert!(req.get(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_get_too_many_lines() {
        let backend = MockBackend::default();
        let mut req = open_three(&backend);
        let err = req.get(&[17, 4, 22, 17]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentMismatch);
        assert!(backend.0.borrow().reads.is_empty());
    }

    #[test]
    fn test_get_invalid_value_fails_whole_call() {
        let backend = MockBackend::default();
        let mut req = open_three(&backend);
        backend.0.borrow_mut().invalid.insert(4);

        let err = req.get(&[17, 4, 22]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(matches!(err, LinuxGpioError::InvalidValue { line: 4 }));

        // Lines without the fault still read fine
        assert_eq!(req.get(&[17]).unwrap(), [PinState::Active]);
    }

    #[test]
    fn test_set_writes_exact_subset() {
        let backend = MockBackend::default();
        let mut req = open_three(&backend);

        req.set(&[4, 17], &[PinState::Active, PinState::Inactive])
            .unwrap();
        {
            let st = backend.0.borrow();
            assert_eq!(
                st.writes.last().unwrap(),
                &[(4, Value::Active), (17, Value::Inactive)]
            );
        }
        assert_eq!(
            req.get(&[17, 4]).unwrap(),
            [PinState::Inactive, PinState::Active]
        );
    }

    #[test]
    fn test_set_failures() {
        let backend = MockBackend::default();
        let mut req = open_three(&backend);

        let err = req.set(&[4, 17], &[PinState::Active]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentMismatch);

        backend.0.borrow_mut().fail_write = true;
        let err = req.set(&[22], &[PinState::Active]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
