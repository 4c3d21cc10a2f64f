//! Process-wide spidev chunk limit
//!
//! spidev rejects any message whose transfers add up to more than its
//! `bufsiz` module parameter. The value is read once, on the first open,
//! and shared by every device. A failed read or parse is not cached, so the
//! next open tries again.

use crate::error::{LinuxSpiError, Result};

use once_cell::sync::OnceCell;

/// Path to kernel spidev buffer size parameter
pub const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// A byte limit resolved at most once
#[derive(Debug, Default)]
pub struct ChunkLimit {
    cell: OnceCell<usize>,
}

impl ChunkLimit {
    /// An unresolved limit
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// The limit, if it has been resolved
    pub fn get(&self) -> Option<usize> {
        self.cell.get().copied()
    }

    /// Return the limit, resolving it from `read` the first time
    ///
    /// Concurrent callers block until one of them has finished; if that one
    /// fails, the cell stays empty.
    pub fn get_or_resolve<F>(&self, read: F) -> Result<usize>
    where
        F: FnOnce() -> Result<String>,
    {
        self.cell
            .get_or_try_init(|| -> Result<usize> {
                let size = parse_bufsiz(&read()?)?;
                log::debug!("linux_spi: Max kernel buffer size: {} bytes", size);
                Ok(size)
            })
            .copied()
    }
}

static CHUNK_LIMIT: ChunkLimit = ChunkLimit::new();

/// Resolve the process-wide limit from sysfs
pub fn chunk_limit() -> Result<usize> {
    CHUNK_LIMIT.get_or_resolve(|| {
        std::fs::read_to_string(BUF_SIZE_SYSFS).map_err(|e| LinuxSpiError::BufferSizeReadFailed {
            path: BUF_SIZE_SYSFS.to_string(),
            source: e,
        })
    })
}

/// Parse a `bufsiz` value: a decimal integer in `1..=i32::MAX`
pub fn parse_bufsiz(content: &str) -> Result<usize> {
    let trimmed = content.trim();
    match trimmed.parse::<i64>() {
        Ok(size) if size > 0 && size <= i64::from(i32::MAX) => Ok(size as usize),
        _ => Err(LinuxSpiError::InvalidBufferSize(trimmed.to_string())),
    }
}
