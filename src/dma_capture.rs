//! C2: translates the DMA controller's circular-buffer position into
//! contiguous byte runs pushed into a `ByteRing` (spec.md §3 "DMA view",
//! §4.1).
//!
//! `last_pos` is the one word this crate shares directly with an ISR
//! outside of the `Signal`/`Mutex` types in `crate::sync`; every access
//! goes through `Clock::critical_section` so a concurrent idle-line
//! interrupt can never observe (or produce) a torn value.

use core::cell::Cell;

use crate::byte_ring::ByteRing;
use crate::platform::Clock;

/// A read-only view over the integrator's DMA ring of capacity `D`, with
/// the single mutable cursor spec.md §3 describes.
pub struct DmaCapture<const D: usize> {
    last_pos: Cell<usize>,
}

// `Cell` is not `Sync`; every mutation of `last_pos` happens inside
// `Clock::critical_section`, which is the safety argument for asserting
// `Sync` here — see spec.md §5 "the only word shared directly between the
// idle-line ISR and other contexts".
unsafe impl<const D: usize> Sync for DmaCapture<D> {}

impl<const D: usize> DmaCapture<D> {
    pub const fn new() -> Self {
        Self {
            last_pos: Cell::new(0),
        }
    }

    /// Called from the peripheral's idle-line interrupt. `dma` is the raw
    /// contents of the hardware DMA ring; `remaining` is the DMA
    /// controller's remaining-count register (`SerialPort::dma_remaining`).
    /// Forwards zero, one, or two contiguous slices of `dma` to `ring`
    /// depending on whether the write position stood still, moved
    /// forward, or wrapped around since the last call. Returns `false` if
    /// any forwarded slice was short-written (bytes dropped by the ring),
    /// matching spec.md §4.1's "short writes... set the return to false
    /// but do not roll back `last_pos`".
    pub fn idle_handler<const N: usize>(
        &self,
        dma: &[u8; D],
        remaining: usize,
        ring: &ByteRing<N>,
        clock: &dyn Clock,
    ) -> bool {
        let current_pos = D - remaining.min(D);
        let mut ok = true;

        clock.critical_section(&mut || {
            let last_pos = self.last_pos.get();

            if current_pos == last_pos {
                // Nothing new since the last idle event.
            } else if current_pos > last_pos {
                let accepted = ring.push_from_isr(&dma[last_pos..current_pos]);
                ok = accepted == current_pos - last_pos;
            } else {
                let tail_accepted = ring.push_from_isr(&dma[last_pos..D]);
                let head_accepted = ring.push_from_isr(&dma[..current_pos]);
                ok = tail_accepted == D - last_pos && head_accepted == current_pos;
            }

            self.last_pos.set(current_pos);
        });

        ok
    }

    /// Re-synchronize the cursor to the start of the DMA ring, e.g. after
    /// a full reset restarts the DMA receiver.
    pub fn reset(&self, clock: &dyn Clock) {
        clock.critical_section(&mut || self.last_pos.set(0));
    }
}

impl<const D: usize> Default for DmaCapture<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::tests::FakeClock;

    fn dma_of(bytes: &[u8]) -> [u8; 8] {
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(bytes);
        buf
    }

    #[test]
    fn equal_positions_forward_nothing() {
        let capture: DmaCapture<8> = DmaCapture::new();
        let ring: ByteRing<16> = ByteRing::new();
        let clock = FakeClock::new();
        let dma = dma_of(b"AAAAAAAA");
        // D - remaining == 0 on both calls: stays at 0.
        assert!(capture.idle_handler(&dma, 8, &ring, &clock));
        assert!(capture.idle_handler(&dma, 8, &ring, &clock));
        let mut out = [0u8; 4];
        assert_eq!(ring.receive_until(b"", &mut out, &clock, 0), 0);
    }

    #[test]
    fn forward_run_is_pushed_contiguously() {
        let capture: DmaCapture<8> = DmaCapture::new();
        let ring: ByteRing<16> = ByteRing::new();
        let clock = FakeClock::new();
        let dma = dma_of(b"ABCDEFGH");
        // remaining = 8 - 4 = 4 bytes written so far (positions 0..4).
        assert!(capture.idle_handler(&dma, 4, &ring, &clock));
        let mut out = [0u8; 8];
        let n = ring.receive_until(b"", &mut out, &clock, 0);
        assert_eq!(&out[..n], b"ABCD");
    }

    #[test]
    fn wrap_around_forwards_tail_then_head() {
        let capture: DmaCapture<8> = DmaCapture::new();
        let ring: ByteRing<32> = ByteRing::new();
        let clock = FakeClock::new();
        let dma = dma_of(b"ABCDEFGH");

        // First call advances last_pos to 6.
        assert!(capture.idle_handler(&dma, 2, &ring, &clock));
        let mut out = [0u8; 32];
        let n = ring.receive_until(b"", &mut out, &clock, 0);
        assert_eq!(&out[..n], b"ABCDEF");

        // Second call wraps: current_pos (2) < last_pos (6), so it should
        // forward dma[6..8] then dma[..2].
        assert!(capture.idle_handler(&dma, 6, &ring, &clock));
        let n = ring.receive_until(b"", &mut out, &clock, 0);
        assert_eq!(&out[..n], b"GHAB");
    }

    #[test]
    fn short_write_is_reported_but_cursor_still_advances() {
        let capture: DmaCapture<8> = DmaCapture::new();
        let ring: ByteRing<2> = ByteRing::new();
        let clock = FakeClock::new();
        let dma = dma_of(b"ABCDEFGH");
        assert!(!capture.idle_handler(&dma, 4, &ring, &clock));
        // Cursor moved on regardless; next call sees no new bytes if the
        // write position stays put.
        assert!(capture.idle_handler(&dma, 4, &ring, &clock));
    }
}
