// src/core/cache/clock.rs

//! A monotonic nanosecond clock for access stamping.

use once_cell::sync::Lazy;
use std::time::Instant;

/// Process-wide origin for all access timestamps.
static ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

/// Nanoseconds elapsed on the monotonic clock since the process origin.
pub fn now_nanos() -> u64 {
    ORIGIN.elapsed().as_nanos() as u64
}

/// The signed nanoseconds from `begin` to `end`.
///
/// Computed as a wrapping difference so ordering stays correct even if the raw
/// values wrap, never by comparing wall-clock times.
pub fn elapsed_nanos(begin: u64, end: u64) -> i64 {
    end.wrapping_sub(begin) as i64
}
