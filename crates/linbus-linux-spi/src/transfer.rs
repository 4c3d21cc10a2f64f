//! Chunked full/half-duplex transfer engine
//!
//! [`transfer`] walks a [`Cursor`] over both legs of a transfer and hands
//! each planned batch to a [`SpiMessage`] implementation, which performs one
//! kernel call per batch. Any failed call aborts the whole transfer and the
//! bytes received so far are dropped.

use crate::error::{LinuxSpiError, Result};
use crate::plan::{Chunk, Cursor};

use linbus_core::buffer::try_alloc;

/// Budget used when a transfer is not split (the descriptor length is 32-bit)
pub const UNCHUNKED_BUDGET: usize = u32::MAX as usize;

/// Issues one multi-descriptor SPI message
pub trait SpiMessage {
    /// Perform `batch` as a single message
    ///
    /// Offsets in each chunk index into `tx` and `rx`, which are the whole
    /// output and input buffers of the transfer.
    fn message(&mut self, batch: &[Chunk], tx: &[u8], rx: &mut [u8]) -> std::io::Result<()>;
}

/// Transmit `out` (if any) while receiving `in_len` bytes
///
/// Each kernel call carries at most `budget` bytes in total. Returns the
/// received bytes, or an empty vector for a write-only transfer. A transfer
/// with nothing to send or receive makes no kernel call.
pub fn transfer<M: SpiMessage + ?Sized>(
    io: &mut M,
    out: Option<&[u8]>,
    in_len: usize,
    budget: usize,
) -> Result<Vec<u8>> {
    let out = out.unwrap_or_default();
    if out.is_empty() && in_len == 0 {
        return Ok(Vec::new());
    }

    let mut input = try_alloc(in_len, 0u8)?;
    let mut cursor = Cursor::new(out.len(), in_len);
    let budget = budget.max(1);

    while !cursor.is_done() {
        let batch = cursor.next_batch(budget);
        log::trace!(
            "linux_spi: message with {} chunk(s): {:?}",
            batch.len(),
            batch.iter().map(|c| c.len).collect::<Vec<_>>()
        );
        io.message(&batch, out, &mut input)
            .map_err(LinuxSpiError::TransferFailed)?;
    }

    Ok(input)
}
