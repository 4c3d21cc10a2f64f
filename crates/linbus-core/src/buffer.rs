//! Length validation and fallible allocation helpers
//!
//! Both hardware crates stage data in heap buffers whose size is chosen by
//! the caller. Allocation goes through `try_reserve_exact` so an oversized
//! request surfaces as an error instead of aborting the process.

use std::collections::TryReserveError;

/// Two caller-supplied sequences that must line up did not
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{what}: {left} and {right}")]
pub struct LengthMismatch {
    /// Description of the two sequences
    pub what: &'static str,
    /// Length of the first sequence
    pub left: usize,
    /// Length of the second sequence (or the capacity it must fit in)
    pub right: usize,
}

/// Require two lengths to be equal
pub fn check_equal_len(
    what: &'static str,
    left: usize,
    right: usize,
) -> Result<(), LengthMismatch> {
    if left != right {
        return Err(LengthMismatch { what, left, right });
    }
    Ok(())
}

/// Require `requested` to be no larger than `capacity`
pub fn check_within(
    what: &'static str,
    requested: usize,
    capacity: usize,
) -> Result<(), LengthMismatch> {
    if requested > capacity {
        return Err(LengthMismatch {
            what,
            left: requested,
            right: capacity,
        });
    }
    Ok(())
}

/// Allocate a vector of exactly `len` copies of `fill`
pub fn try_alloc<T: Clone>(len: usize, fill: T) -> Result<Vec<T>, TryReserveError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, fill);
    Ok(buf)
}

/// Allocate an empty vector able to hold `len` elements without reallocating
pub fn try_with_capacity<T>(len: usize) -> Result<Vec<T>, TryReserveError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    Ok(buf)
}
