//! The small set of capabilities this crate requires from its integrator.
//!
//! spec.md §1 treats the serial peripheral driver, its DMA controller, and
//! the interrupt vector table as external collaborators; §6.1 lists the
//! five platform hooks and the kernel primitives (bounded mutex, binary
//! signal, tick-based timeout) a real implementation needs. The mutex and
//! signal are provided by `crate::sync`; what's left — starting/aborting
//! DMA transfers, reading the DMA controller's remaining-count register,
//! and a tick clock with an interrupt-masking hook — is captured here as
//! two object-safe traits so a board crate can hand the dispatcher a
//! `&mut dyn SerialPort` and a `&dyn Clock` without this crate knowing
//! anything about cortex-m, riscv, or any other architecture.

use crate::error::Error;

/// The UART/DMA peripheral, as seen from the dispatcher's side.
///
/// Implementations own the actual register access; every method here is
/// expected to return promptly (no blocking), matching spec.md §5's "no
/// ISR path may suspend" rule extended to the non-ISR calls the dispatcher
/// makes into this trait as well.
pub trait SerialPort {
    /// Arm the DMA receiver into a ring of the given capacity. Called once
    /// at init and again after `abort_rx` during a reset.
    fn start_rx_dma(&mut self, capacity: usize);

    /// The DMA controller's remaining-count register, used by
    /// `DmaCapture::idle_handler` to derive the current write position.
    fn dma_remaining(&self) -> usize;

    /// Start an asynchronous DMA transmit of `bytes`. Returns
    /// `Err(Error::SendFail)` if the peripheral rejects the transfer
    /// immediately; completion is reported later via the board's
    /// TX-complete ISR calling `Dispatcher::on_tx_complete`.
    fn start_tx_dma(&mut self, bytes: &[u8]) -> Result<(), Error>;

    /// Abort any in-flight transmit. Used during a full reset.
    fn abort_tx(&mut self);

    /// Abort any in-flight receive. Used during a full reset.
    fn abort_rx(&mut self);
}

/// Tick-based timing and the one piece of ISR-safe shared state this crate
/// needs protected (`DmaCapture::last_pos`, spec.md §3 "DMA view").
pub trait Clock {
    /// Monotonic tick counter. The unit is whatever the integrator's
    /// `*_ticks` timeout parameters are expressed in; this crate never
    /// assumes a specific tick rate.
    fn now_ticks(&self) -> u64;

    /// Ticks per millisecond, used to convert the millisecond constants in
    /// `crate::config` into tick counts.
    fn ticks_per_ms(&self) -> u64;

    /// Cooperatively yield to the scheduler. Called between polls of a
    /// bounded wait; on a board with no real scheduler this can be a
    /// no-op busy-spin.
    fn yield_now(&self);

    /// Run `f` with interrupts masked, for a torn-value-free
    /// read-modify-write of DMA's `last_pos` cursor (spec.md §3, §5).
    fn critical_section(&self, f: &mut dyn FnMut());
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use core::cell::Cell;

    /// A `Clock` with a manually-advanced tick counter, no real yielding,
    /// and a critical section that is just a direct call (single-threaded
    /// test process, no concurrent ISR to race with).
    pub struct FakeClock {
        ticks: Cell<u64>,
    }

    impl FakeClock {
        pub fn new() -> Self {
            Self { ticks: Cell::new(0) }
        }

        pub fn advance(&self, ticks: u64) {
            self.ticks.set(self.ticks.get() + ticks);
        }
    }

    impl Clock for FakeClock {
        fn now_ticks(&self) -> u64 {
            // Each poll advances time so bounded loops in tests terminate
            // without needing a real scheduler or sleep.
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            t
        }

        fn ticks_per_ms(&self) -> u64 {
            1
        }

        fn yield_now(&self) {}

        fn critical_section(&self, f: &mut dyn FnMut()) {
            f();
        }
    }
}
