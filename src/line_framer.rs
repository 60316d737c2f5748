//! C3: turns the byte ring into a stream of complete, null-terminated
//! lines (spec.md §4.2).
//!
//! Deliberately thin — `ByteRing::receive_until` already implements the
//! delimiter/capacity/timeout race described in spec.md §4.1; this module
//! just fixes the delimiter to the configured line terminator and turns an
//! empty result (pure timeout, nothing arrived) into `None` so the
//! dispatch loop can tell "no line yet" from "an empty line arrived".

use crate::byte_ring::ByteRing;
use crate::config::LINE_TERMINATOR;
use crate::platform::Clock;

pub struct LineFramer<'a> {
    terminator: &'a [u8],
}

impl<'a> LineFramer<'a> {
    pub const fn new() -> Self {
        Self {
            terminator: LINE_TERMINATOR,
        }
    }

    /// Build a framer with a non-default terminator. Spec.md §3 allows
    /// the line terminator to be overridden at build time; this is the
    /// hook for a caller that needs a single custom delimiter.
    pub const fn with_terminator(terminator: &'a [u8]) -> Self {
        Self { terminator }
    }

    /// Read one line into `out`, waiting up to `timeout_ticks`. Returns
    /// `None` if nothing arrived before the timeout; the dispatcher is
    /// expected to immediately loop on `None` (spec.md §4.2).
    pub fn next_line<const N: usize>(
        &self,
        ring: &ByteRing<N>,
        out: &mut [u8],
        clock: &dyn Clock,
        timeout_ticks: u64,
    ) -> Option<usize> {
        let n = ring.receive_until(self.terminator, out, clock, timeout_ticks);
        if n == 0 {
            None
        } else {
            Some(n)
        }
    }
}

impl<'a> Default for LineFramer<'a> {
    fn default() -> Self {
        Self::new()
    }
}
