//! Linux spidev device
//!
//! This module provides [`SpiDevice`], an open `/dev/spidevX.Y` node
//! configured for a clock mode, speed and 8-bit words, and the ioctl glue
//! that carries planned batches to the kernel.

use crate::chunk::chunk_limit;
use crate::error::{LinuxSpiError, Result};
use crate::plan::{Chunk, MAX_BATCH};
use crate::transfer::{self, SpiMessage, UNCHUNKED_BUDGET};

use bitflags::bitflags;
use linbus_core::{BitOrder, ClockMode, Duplex, SpiConfig};

use std::fs::{File, OpenOptions};
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};

/// Default SPI clock speed in Hz (2 MHz)
pub const DEFAULT_SPEED_HZ: u32 = 2_000_000;

/// Word size applied at open time
const BITS_PER_WORD: u8 = 8;

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    // SPI ioctl magic number
    pub const SPI_IOC_MAGIC: u8 = b'k';

    // SPI ioctl type numbers
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;
    const SPI_IOC_TYPE_MODE32: u8 = 5;

    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );
    ioctl_write_ptr!(spi_ioc_wr_mode32, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE32, u32);

    /// Calculate ioctl number for SPI_IOC_MESSAGE(n)
    ///
    /// SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(struct spi_ioc_transfer)])
    pub fn spi_ioc_message(n: usize) -> libc::c_ulong {
        let size = n * std::mem::size_of::<super::SpiIocTransfer>();
        // _IOC(dir, type, nr, size) = ((dir)<<30)|((size)<<16)|((type)<<8)|(nr), _IOC_WRITE = 1
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

bitflags! {
    /// Kernel `SPI_*` mode bits accepted by `SPI_IOC_WR_MODE32`
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KernelMode: u32 {
        /// Sample on the second clock edge
        const CPHA      = 0x01;
        /// Clock idles high
        const CPOL      = 0x02;
        /// Chip select is active-high
        const CS_HIGH   = 0x04;
        /// Least significant bit first
        const LSB_FIRST = 0x08;
        /// Shared SI/SO line
        const THREE_WIRE = 0x10;
    }
}

impl KernelMode {
    /// Kernel mode word for `config`; chip select is always active-high
    pub fn from_config(config: &SpiConfig) -> Self {
        let mut mode = KernelMode::CS_HIGH;
        mode.set(KernelMode::CPHA, config.clock_mode.cpha() != 0);
        mode.set(KernelMode::CPOL, config.clock_mode.cpol() != 0);
        mode.set(KernelMode::LSB_FIRST, config.bit_order == BitOrder::LsbFirst);
        mode.set(KernelMode::THREE_WIRE, config.duplex == Duplex::Half);
        mode
    }
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct SpiIocTransfer {
    tx_buf: u64,          // __u64 tx_buf
    rx_buf: u64,          // __u64 rx_buf
    len: u32,             // __u32 len
    speed_hz: u32,        // __u32 speed_hz
    delay_usecs: u16,     // __u16 delay_usecs
    bits_per_word: u8,    // __u8 bits_per_word
    cs_change: u8,        // __u8 cs_change
    tx_nbits: u8,         // __u8 tx_nbits
    rx_nbits: u8,         // __u8 rx_nbits
    word_delay_usecs: u8, // __u8 word_delay_usecs
    _pad: u8,             // padding
}

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock speed in Hz (default: 2 MHz)
    pub speed_hz: u32,
    /// Clock mode, bit order and duplex
    pub mode: SpiConfig,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            mode: SpiConfig::default(),
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set clock mode, bit order and duplex
    pub fn with_mode(mut self, mode: SpiConfig) -> Self {
        self.mode = mode;
        self
    }
}

/// The three settings applied to a spidev node at open time
pub trait SpiSetup {
    /// `SPI_IOC_WR_MODE32`
    fn set_mode32(&mut self, mode: u32) -> std::io::Result<()>;
    /// `SPI_IOC_WR_MAX_SPEED_HZ`
    fn set_speed(&mut self, speed_hz: u32) -> std::io::Result<()>;
    /// `SPI_IOC_WR_BITS_PER_WORD`
    fn set_bits(&mut self, bits: u8) -> std::io::Result<()>;
}

impl SpiSetup for File {
    fn set_mode32(&mut self, mode: u32) -> std::io::Result<()> {
        unsafe { ioctl::spi_ioc_wr_mode32(self.as_raw_fd(), &mode) }
            .map(|_| ())
            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
    }

    fn set_speed(&mut self, speed_hz: u32) -> std::io::Result<()> {
        unsafe { ioctl::spi_ioc_wr_max_speed_hz(self.as_raw_fd(), &speed_hz) }
            .map(|_| ())
            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
    }

    fn set_bits(&mut self, bits: u8) -> std::io::Result<()> {
        unsafe { ioctl::spi_ioc_wr_bits_per_word(self.as_raw_fd(), &bits) }
            .map(|_| ())
            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))
    }
}

/// Apply mode, speed and word size to `handle`, in that order
///
/// On failure `handle` is dropped (closing it) before the error is returned.
pub fn configure<S: SpiSetup>(mut handle: S, config: &LinuxSpiConfig) -> Result<S> {
    let path = &config.device;

    let mode = KernelMode::from_config(&config.mode).bits();
    handle
        .set_mode32(mode)
        .map_err(|e| LinuxSpiError::SetModeFailed {
            path: path.clone(),
            mode,
            source: e,
        })?;

    let speed = config.speed_hz;
    handle
        .set_speed(speed)
        .map_err(|e| LinuxSpiError::SetSpeedFailed {
            path: path.clone(),
            speed,
            source: e,
        })?;

    let bits = BITS_PER_WORD;
    handle
        .set_bits(bits)
        .map_err(|e| LinuxSpiError::SetBitsPerWordFailed {
            path: path.clone(),
            bits,
            source: e,
        })?;

    Ok(handle)
}

/// The spidev file descriptor as a message sink
struct Spidev<'a>(&'a File);

impl SpiMessage for Spidev<'_> {
    fn message(&mut self, batch: &[Chunk], tx: &[u8], rx: &mut [u8]) -> std::io::Result<()> {
        let mut transfers = [SpiIocTransfer::default(); MAX_BATCH];
        let count = batch.len().min(MAX_BATCH);

        for (req, chunk) in transfers.iter_mut().zip(&batch[..count]) {
            req.len = chunk.len as u32;
            if let Some(off) = chunk.tx_offset {
                req.tx_buf = tx[off..off + chunk.len].as_ptr() as u64;
            }
            if let Some(off) = chunk.rx_offset {
                req.rx_buf = rx[off..off + chunk.len].as_mut_ptr() as u64;
            }
        }

        // SAFETY: every non-zero buffer pointer refers to `len` bytes of `tx`
        // or `rx`, both of which outlive the call.
        let ret = unsafe {
            libc::ioctl(
                self.0.as_raw_fd(),
                ioctl::spi_ioc_message(count),
                transfers.as_ptr(),
            )
        };
        if ret < 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }
}

/// An open, configured spidev node
#[derive(Debug)]
pub struct SpiDevice {
    /// File handle for spidev device
    file: File,
    /// Process-wide chunk limit, resolved when this device was opened
    chunk_limit: usize,
}

impl SpiDevice {
    /// Open and configure the device named in `config`
    ///
    /// Mode, speed and word size are applied in that order; if any is
    /// rejected the device is closed again.
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        let chunk_limit = chunk_limit()?;

        log::debug!("linux_spi: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let file = configure(file, config)?;

        log::info!(
            "linux_spi: Opened {} (mode={:#x}, speed={} kHz)",
            config.device,
            KernelMode::from_config(&config.mode).bits(),
            config.speed_hz / 1000
        );

        Ok(Self { file, chunk_limit })
    }

    /// Largest total byte count of one kernel message in chunked transfers
    pub fn chunk_limit(&self) -> usize {
        self.chunk_limit
    }

    /// Transmit `out` (if any) while receiving `in_len` bytes
    ///
    /// With `chunked` set, no kernel message exceeds the spidev buffer
    /// size; otherwise the whole transfer is handed to the driver at once.
    pub fn transfer(&mut self, out: Option<&[u8]>, in_len: usize, chunked: bool) -> Result<Vec<u8>> {
        let budget = if chunked {
            self.chunk_limit
        } else {
            UNCHUNKED_BUDGET
        };
        transfer::transfer(&mut Spidev(&self.file), out, in_len, budget)
    }

    /// Close the device, reporting a failed close
    pub fn close(self) -> Result<()> {
        log::debug!("linux_spi: Closing device");
        close_raw(self.file.into_raw_fd())
    }
}

/// Close a raw spidev descriptor
///
/// Non-positive descriptors are treated as already closed.
pub fn close_raw(fd: RawFd) -> Result<()> {
    if fd <= 0 {
        return Ok(());
    }
    if unsafe { libc::close(fd) } < 0 {
        return Err(LinuxSpiError::CloseFailed(std::io::Error::last_os_error()));
    }
    Ok(())
}

/// Parse `key=value` bus options from a list of key-value pairs
///
/// # Supported Options
///
/// - `dev=/dev/spidevX.Y` - device path (required)
/// - `spispeed=N` - clock speed in kHz (default: 2000)
/// - `mode=N` - clock mode 0-3 (default: 0)
/// - `lsb=yes|no` - shift the least significant bit first
/// - `3wire=yes|no` - half-duplex on a shared data line
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxSpiConfig> {
    let mut config = LinuxSpiConfig::default();

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "spispeed" => {
                // Parse speed in kHz
                let speed_khz: u32 = value
                    .parse()
                    .map_err(|_| invalid(key, value))?;
                config.speed_hz = speed_khz
                    .checked_mul(1000)
                    .ok_or_else(|| invalid(key, value))?;
            }
            "mode" => {
                let mode: u8 = value
                    .parse()
                    .map_err(|_| invalid(key, value))?;
                config.mode.clock_mode = ClockMode::try_from(mode)
                    .map_err(|m| {
                        LinuxSpiError::InvalidParameter(format!("SPI mode {} (must be 0-3)", m))
                    })?;
            }
            "lsb" => {
                config.mode.bit_order = if parse_bool(key, value)? {
                    BitOrder::LsbFirst
                } else {
                    BitOrder::MsbFirst
                };
            }
            "3wire" => {
                config.mode.duplex = if parse_bool(key, value)? {
                    Duplex::Half
                } else {
                    Duplex::Full
                };
            }
            _ => {
                log::warn!("linux_spi: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err(LinuxSpiError::NoDevice);
    }

    Ok(config)
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: &str) -> LinuxSpiError {
    LinuxSpiError::InvalidParameter(format!("Invalid {} value: {}", key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use linbus_core::{ErrorKind, HasErrorKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_transfer_struct_layout() {
        assert_eq!(std::mem::size_of::<SpiIocTransfer>(), 32);
        // SPI_IOC_MESSAGE(1) and (2) as computed by the kernel headers
        assert_eq!(ioctl::spi_ioc_message(1), 0x4020_6B00);
        assert_eq!(ioctl::spi_ioc_message(2), 0x4040_6B00);
    }

    #[test]
    fn test_kernel_mode() {
        let mode = KernelMode::from_config(&SpiConfig::default());
        assert_eq!(mode, KernelMode::CS_HIGH);

        let cfg = SpiConfig::new(ClockMode::Mode3).lsb_first().half_duplex();
        assert_eq!(KernelMode::from_config(&cfg).bits(), 0x04 | 0x03 | 0x08 | 0x10);

        let cfg = SpiConfig::new(ClockMode::Mode2);
        assert_eq!(KernelMode::from_config(&cfg).bits(), 0x04 | 0x02);
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[
            ("dev", "/dev/spidev0.0"),
            ("spispeed", "6000"),
            ("mode", "1"),
            ("3wire", "yes"),
        ])
        .unwrap();
        assert_eq!(config.device, "/dev/spidev0.0");
        assert_eq!(config.speed_hz, 6_000_000);
        assert_eq!(config.mode.clock_mode, ClockMode::Mode1);
        assert_eq!(config.mode.bit_order, BitOrder::MsbFirst);
        assert!(config.mode.is_half_duplex());

        assert!(parse_options(&[("spispeed", "100")]).is_err());
        assert!(parse_options(&[("dev", "/dev/spidev0.0"), ("mode", "4")]).is_err());
        assert!(parse_options(&[("dev", "/dev/spidev0.0"), ("lsb", "maybe")]).is_err());
        assert!(parse_options(&[("dev", "/dev/spidev0.0"), ("spispeed", "5000000")]).is_err());

        let err = parse_options(&[("spispeed", "100")]).unwrap_err();
        assert!(matches!(err, LinuxSpiError::NoDevice));
        let err = parse_options(&[("dev", "/dev/spidev0.0"), ("mode", "x")]).unwrap_err();
        assert!(matches!(err, LinuxSpiError::InvalidParameter(_)));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    /// Records settings in order; fails the step named in `fail_at`
    struct FakeNode {
        log: Rc<RefCell<Vec<String>>>,
        fail_at: Option<&'static str>,
    }

    impl FakeNode {
        fn step(&mut self, name: &'static str, value: u32) -> std::io::Result<()> {
            self.log.borrow_mut().push(format!("{}={:#x}", name, value));
            if self.fail_at == Some(name) {
                return Err(std::io::Error::from_raw_os_error(libc::EINVAL));
            }
            Ok(())
        }
    }

    impl SpiSetup for FakeNode {
        fn set_mode32(&mut self, mode: u32) -> std::io::Result<()> {
            self.step("mode", mode)
        }

        fn set_speed(&mut self, speed_hz: u32) -> std::io::Result<()> {
            self.step("speed", speed_hz)
        }

        fn set_bits(&mut self, bits: u8) -> std::io::Result<()> {
            self.step("bits", bits as u32)
        }
    }

    impl Drop for FakeNode {
        fn drop(&mut self) {
            self.log.borrow_mut().push("closed".to_string());
        }
    }

    fn fake(fail_at: Option<&'static str>) -> (FakeNode, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let node = FakeNode {
            log: Rc::clone(&log),
            fail_at,
        };
        (node, log)
    }

    fn test_config() -> LinuxSpiConfig {
        LinuxSpiConfig::new("/dev/spidev1.0")
            .with_speed(1_000_000)
            .with_mode(SpiConfig::new(ClockMode::Mode1))
    }

    #[test]
    fn test_configure_order() {
        let (node, log) = fake(None);
        let node = configure(node, &test_config()).unwrap();
        assert_eq!(*log.borrow(), ["mode=0x5", "speed=0xf4240", "bits=0x8"]);
        drop(node);
        assert_eq!(log.borrow().last().unwrap(), "closed");
    }

    #[test]
    fn test_configure_failure_closes_node() {
        for (step, applied) in [("mode", 1), ("speed", 2), ("bits", 3)] {
            let (node, log) = fake(Some(step));
            let err = configure(node, &test_config()).err().unwrap();
            assert_eq!(err.kind(), ErrorKind::Configuration);
            match step {
                "mode" => assert!(matches!(err, LinuxSpiError::SetModeFailed { mode: 0x05, .. })),
                "speed" => assert!(matches!(
                    err,
                    LinuxSpiError::SetSpeedFailed { speed: 1_000_000, .. }
                )),
                _ => assert!(matches!(err, LinuxSpiError::SetBitsPerWordFailed { bits: 8, .. })),
            }
            assert!(err.to_string().contains("/dev/spidev1.0"));

            // Later steps are not attempted and the node is closed.
            let log = log.borrow();
            assert_eq!(log.len(), applied + 1);
            assert_eq!(log.last().unwrap(), "closed");
        }
    }

    #[test]
    fn test_close_raw_ignores_non_positive() {
        assert!(close_raw(-1).is_ok());
        assert!(close_raw(0).is_ok());
    }

    #[test]
    fn test_open_missing_device() {
        let err = SpiDevice::open(&LinuxSpiConfig::default()).unwrap_err();
        assert!(matches!(err, LinuxSpiError::NoDevice));
    }
}
