//! C1: a bounded byte FIFO that an ISR producer can push into without ever
//! blocking, and that a cooperative consumer drains with a bounded wait
//! (spec.md §4.1).
//!
//! Single-producer/single-consumer by construction (one ISR path feeds
//! one dispatcher task), so unlike `crate::sync::Mutex` this is built
//! directly on a pair of monotonic atomic cursors rather than a lock —
//! spec.md §3 is explicit that "producer never blocks", which a lock-based
//! design cannot guarantee if the consumer is ever interrupted while
//! holding it.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::platform::Clock;

/// A fixed-capacity byte ring of `N` slots.
pub struct ByteRing<const N: usize> {
    storage: UnsafeCell<[u8; N]>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// SAFETY: `storage` is only ever written by the single ISR producer
// (`push_from_isr`) and only ever read by the single cooperative consumer
// (`receive_until`), and the head/tail atomics order every byte written
// before the consumer's index can observe it — a true SPSC ring, never a
// plain shared mutable buffer.
unsafe impl<const N: usize> Sync for ByteRing<N> {}

impl<const N: usize> ByteRing<N> {
    pub const fn new() -> Self {
        Self {
            storage: UnsafeCell::new([0u8; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    fn len(&self) -> usize {
        self.head
            .load(Ordering::Acquire)
            .wrapping_sub(self.tail.load(Ordering::Acquire))
    }

    /// Push as many of `bytes` as fit; the rest are silently dropped. The
    /// return value is the number actually accepted, so callers (C2) can
    /// observe and log the drop without the ring itself blocking or
    /// panicking. Safe to call from ISR context.
    pub fn push_from_isr(&self, bytes: &[u8]) -> usize {
        let free = N - self.len();
        let accepted = bytes.len().min(free);
        if accepted == 0 {
            return 0;
        }
        // SAFETY: only the producer ever writes `storage`, and only at
        // indices not yet visible to the consumer (bounded by `free` above).
        let storage = unsafe { &mut *self.storage.get() };
        let mut head = self.head.load(Ordering::Relaxed);
        for &b in &bytes[..accepted] {
            storage[head % N] = b;
            head = head.wrapping_add(1);
        }
        self.head.store(head, Ordering::Release);
        accepted
    }

    /// Pop bytes into `out` until the trailing bytes of `out` equal
    /// `delim`, until `out.len() - 1` bytes have been accumulated, or
    /// until `timeout_ticks` have elapsed. `out` is always null-terminated
    /// on return. Returns the number of bytes written (excluding the
    /// terminator), which is 0 on a pure timeout with no bytes seen.
    pub fn receive_until(
        &self,
        delim: &[u8],
        out: &mut [u8],
        clock: &dyn Clock,
        timeout_ticks: u64,
    ) -> usize {
        assert!(!out.is_empty(), "receive_until needs room for a terminator");
        let cap = out.len() - 1;
        let deadline = clock.now_ticks().saturating_add(timeout_ticks);
        let mut written = 0usize;

        while written < cap {
            if self.len() == 0 {
                if clock.now_ticks() >= deadline {
                    break;
                }
                clock.yield_now();
                continue;
            }

            // SAFETY: only the consumer ever reads `storage`, and only at
            // indices already committed by the producer (bounded by `len`).
            let storage = unsafe { &*self.storage.get() };
            let tail = self.tail.load(Ordering::Relaxed);
            let b = storage[tail % N];
            self.tail.store(tail.wrapping_add(1), Ordering::Release);

            out[written] = b;
            written += 1;

            if !delim.is_empty() && written >= delim.len() && &out[written - delim.len()..written] == delim
            {
                break;
            }
        }

        out[written] = 0;
        written
    }

    /// Drop all buffered bytes, e.g. during a full reset (spec.md §5
    /// "Cancellation").
    pub fn reset(&self) {
        self.tail.store(self.head.load(Ordering::Acquire), Ordering::Release);
    }
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::tests::FakeClock;

    #[test]
    fn push_then_receive_roundtrip() {
        let ring: ByteRing<16> = ByteRing::new();
        assert_eq!(ring.push_from_isr(b"OK\r\n"), 4);
        let clock = FakeClock::new();
        let mut out = [0u8; 16];
        let n = ring.receive_until(b"\r\n", &mut out, &clock, 100);
        assert_eq!(n, 4);
        assert_eq!(&out[..n], b"OK\r\n");
        assert_eq!(out[n], 0);
    }

    #[test]
    fn overflow_drops_excess_and_reports_short_count() {
        let ring: ByteRing<4> = ByteRing::new();
        assert_eq!(ring.push_from_isr(b"abcdef"), 4);
    }

    #[test]
    fn timeout_with_no_bytes_returns_zero() {
        let ring: ByteRing<16> = ByteRing::new();
        let clock = FakeClock::new();
        let mut out = [0u8; 8];
        let n = ring.receive_until(b"\r\n", &mut out, &clock, 3);
        assert_eq!(n, 0);
        assert_eq!(out[0], 0);
    }

    #[test]
    fn truncates_at_capacity_minus_one_and_stays_null_terminated() {
        let ring: ByteRing<64> = ByteRing::new();
        ring.push_from_isr(b"0123456789");
        let clock = FakeClock::new();
        let mut out = [0xAAu8; 5];
        let n = ring.receive_until(b"\r\n", &mut out, &clock, 100);
        assert_eq!(n, 4);
        assert_eq!(&out[..4], b"0123");
        assert_eq!(out[4], 0);
    }

    #[test]
    fn reset_drops_pending_bytes() {
        let ring: ByteRing<16> = ByteRing::new();
        ring.push_from_isr(b"stale");
        ring.reset();
        assert_eq!(ring.len(), 0);
    }
}
