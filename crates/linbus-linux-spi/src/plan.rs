//! Splitting a transfer into kernel-sized batches
//!
//! A transfer has two legs, transmit and receive, of possibly different
//! lengths. Each kernel call carries one or two chunk descriptors whose
//! lengths together stay within a byte budget. The first descriptor serves
//! both legs as far as they overlap; if budget remains, a second one
//! continues with whatever is left in the same call.

/// Maximum number of descriptors per kernel call
pub const MAX_BATCH: usize = 2;

/// One transfer descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Bytes clocked by this descriptor
    pub len: usize,
    /// Start of the transmitted bytes in the output buffer, if transmitting
    pub tx_offset: Option<usize>,
    /// Start of the received bytes in the input buffer, if receiving
    pub rx_offset: Option<usize>,
}

/// Descriptors for one kernel call
pub type Batch = heapless::Vec<Chunk, MAX_BATCH>;

/// Length of the next descriptor given what is left of each leg
///
/// If one leg is finished, or both have the same amount left, the
/// descriptor covers everything left. Otherwise it stops where the shorter
/// leg ends, so the longer leg's tail goes into a descriptor of its own.
/// The result never exceeds `budget`.
pub fn chunk_len(tx_remaining: usize, rx_remaining: usize, budget: usize) -> usize {
    let len = if tx_remaining == 0 || rx_remaining == 0 || tx_remaining == rx_remaining {
        tx_remaining.max(rx_remaining)
    } else {
        tx_remaining.min(rx_remaining)
    };
    len.min(budget)
}

/// Position within both legs of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    tx_pos: usize,
    tx_len: usize,
    rx_pos: usize,
    rx_len: usize,
}

impl Cursor {
    /// Start of a transfer of `tx_len` output and `rx_len` input bytes
    pub fn new(tx_len: usize, rx_len: usize) -> Self {
        Self {
            tx_pos: 0,
            tx_len,
            rx_pos: 0,
            rx_len,
        }
    }

    /// Output bytes not yet covered by a descriptor
    pub fn tx_remaining(&self) -> usize {
        self.tx_len - self.tx_pos
    }

    /// Input bytes not yet covered by a descriptor
    pub fn rx_remaining(&self) -> usize {
        self.rx_len - self.rx_pos
    }

    /// True once both legs are fully covered
    pub fn is_done(&self) -> bool {
        self.tx_remaining() == 0 && self.rx_remaining() == 0
    }

    /// Plan the next kernel call and advance past it
    ///
    /// `budget` is the maximum total length of the returned descriptors and
    /// must be non-zero. Returns an empty batch once the cursor is done.
    pub fn next_batch(&mut self, budget: usize) -> Batch {
        let mut batch = Batch::new();
        let mut budget = budget;

        while !self.is_done() && budget > 0 && !batch.is_full() {
            let chunk = self.take(&mut budget);
            // Cannot fail: the loop stops when the batch is full
            let _ = batch.push(chunk);
        }
        batch
    }

    fn take(&mut self, budget: &mut usize) -> Chunk {
        let len = chunk_len(self.tx_remaining(), self.rx_remaining(), *budget);
        *budget -= len;

        let mut chunk = Chunk {
            len,
            tx_offset: None,
            rx_offset: None,
        };
        if self.tx_remaining() > 0 {
            chunk.tx_offset = Some(self.tx_pos);
            self.tx_pos += len;
        }
        if self.rx_remaining() > 0 {
            chunk.rx_offset = Some(self.rx_pos);
            self.rx_pos += len;
        }
        chunk
    }
}
