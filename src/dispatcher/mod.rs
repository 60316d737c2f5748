//! C5: the dispatcher — the single cooperative task that owns the
//! consume loop (spec.md §4.2), and the shared state §3 says it,
//! `send_receive` (C6, `send_receive.rs`), and `send` (C7, `transmit.rs`)
//! all touch.
//!
//! Centralizes the "release handler-mutex before invoking a handler" rule
//! spec.md §9 singles out as something a re-implementation should
//! consolidate rather than leave scattered across the table-scan code: the
//! only place in this crate that calls a `LineHandler` is
//! [`Dispatcher::dispatch_line`], and it never does so while holding a
//! lock.

mod send_receive;
mod transmit;

use crate::byte_ring::ByteRing;
use crate::config::HANDLER_MUTEX_TIMEOUT_MS;
use crate::dma_capture::DmaCapture;
use crate::error::{Error, Result};
use crate::handler_table::{Callback, HandlerTable, LineHandler};
use crate::line_framer::LineFramer;
use crate::platform::{Clock, SerialPort};
use crate::sync::{Mutex, Signal};

/// The send-receive slot (spec.md §3 "Dispatcher state"): non-active means
/// no synchronous request is outstanding. The output buffer is borrowed
/// from the caller's stack for the duration of one `send_receive` call;
/// since it must be reachable from the dispatch loop through the shared,
/// 'static-ish `Dispatcher` state rather than through a borrow the type
/// system can track across that boundary, it is held as a raw pointer.
/// The invariant that makes this sound: `out_ptr`/`cap` are only ever
/// read while `active` is `true`, and `active` only becomes `true` inside
/// `send_receive` (which owns the pointed-to buffer for as long as it
/// remains `true`) and only becomes `false` again inside that same call's
/// own cleanup step, by which point it has stopped touching the slot.
pub(crate) struct SrSlot {
    active: bool,
    out_ptr: *mut u8,
    cap: usize,
    len: usize,
}

impl SrSlot {
    const fn inactive() -> Self {
        Self {
            active: false,
            out_ptr: core::ptr::null_mut(),
            cap: 0,
            len: 0,
        }
    }

    /// Append `bytes` to the accumulator, truncating silently but always
    /// leaving the buffer null-terminated (spec.md §4.4).
    fn accumulate(&mut self, bytes: &[u8]) {
        if !self.active || self.cap == 0 {
            return;
        }
        // SAFETY: see the invariant documented on `SrSlot`.
        let out = unsafe { core::slice::from_raw_parts_mut(self.out_ptr, self.cap) };
        let room = self.cap.saturating_sub(1).saturating_sub(self.len);
        let n = bytes.len().min(room);
        out[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
        out[self.len] = 0;
    }
}

struct HandlerState<'a> {
    table: HandlerTable<'a>,
    sr: SrSlot,
}

struct TxState<S: SerialPort, const T: usize> {
    uart: S,
    scratch: heapless::Vec<u8, T>,
}

/// The dispatcher singleton. `'a` is the lifetime borrowed callbacks and
/// prefixes registered with it must outlive; `N`/`D`/`T` are the byte
/// ring, DMA ring, and transmit scratch capacities (spec.md §6.4).
pub struct Dispatcher<'a, S, C, const N: usize, const D: usize, const T: usize>
where
    S: SerialPort,
    C: Clock,
{
    clock: &'a C,
    ring: ByteRing<N>,
    dma: DmaCapture<D>,
    framer: LineFramer<'static>,
    handlers: Mutex<HandlerState<'a>>,
    tx: Mutex<TxState<S, T>>,
    tx_done: Signal,
    sr_matched: Signal,
}

impl<'a, S, C, const N: usize, const D: usize, const T: usize> Dispatcher<'a, S, C, N, D, T>
where
    S: SerialPort,
    C: Clock,
{
    pub fn new(uart: S, clock: &'a C) -> Self {
        Self {
            clock,
            ring: ByteRing::new(),
            dma: DmaCapture::new(),
            framer: LineFramer::new(),
            handlers: Mutex::new(HandlerState {
                table: HandlerTable::new(),
                sr: SrSlot::inactive(),
            }),
            tx: Mutex::new(TxState {
                uart,
                scratch: heapless::Vec::new(),
            }),
            tx_done: Signal::new(),
            sr_matched: Signal::new(),
        }
    }

    /// Arm DMA reception. Must be called once before the dispatch loop
    /// starts consuming lines.
    pub fn init(&self) -> Result<()> {
        let mut tx = self.tx.lock(self.clock);
        tx.uart.start_rx_dma(D);
        Ok(())
    }

    /// Abort in-flight I/O, drop buffered bytes, and restart reception.
    /// Leaves the handler table and any outstanding send-receive slot
    /// untouched (spec.md §5 "Cancellation": an in-flight send-receive is
    /// left to time out naturally).
    pub fn reset(&self) -> Result<()> {
        let mut tx = self.tx.lock(self.clock);
        tx.uart.abort_tx();
        tx.uart.abort_rx();
        self.ring.reset();
        self.dma.reset(self.clock);
        tx.uart.start_rx_dma(D);
        Ok(())
    }

    /// `handler-mutex`'s bound, in the caller's tick units (spec.md §4.2).
    fn handler_mutex_timeout_ticks(&self) -> u64 {
        self.clock.ticks_per_ms().saturating_mul(HANDLER_MUTEX_TIMEOUT_MS)
    }

    pub fn register(&self, prefix: &'a [u8], callback: &'a dyn LineHandler) -> Result<()> {
        let mut guard = self
            .handlers
            .lock_timeout(self.clock, self.handler_mutex_timeout_ticks())
            .ok_or(Error::Busy)?;
        guard.table.register(prefix, callback)
    }

    pub fn register_urc(&self, prefix: &'a [u8], callback: &'a dyn LineHandler) -> Result<()> {
        let mut guard = self
            .handlers
            .lock_timeout(self.clock, self.handler_mutex_timeout_ticks())
            .ok_or(Error::Busy)?;
        guard.table.register_urc(prefix, callback)
    }

    pub fn unregister(&self, prefix: &[u8]) -> Result<()> {
        let mut guard = self
            .handlers
            .lock_timeout(self.clock, self.handler_mutex_timeout_ticks())
            .ok_or(Error::Busy)?;
        guard.table.unregister(prefix)
    }

    /// Called from the peripheral's idle-line interrupt (spec.md §4.1 C2).
    pub fn idle_handler(&self, dma: &[u8; D]) -> bool {
        let remaining = {
            // `dma_remaining` only reads a register; take the tx lock just
            // long enough to reach the peripheral handle. On a board where
            // this is itself ISR-unsafe the integrator's `SerialPort` impl
            // is expected to make the register read itself lock-free.
            let tx = self.tx.try_lock();
            match tx {
                Some(tx) => tx.uart.dma_remaining(),
                None => return false,
            }
        };
        self.dma.idle_handler(dma, remaining, &self.ring, self.clock)
    }

    /// Called from the peripheral's TX-complete interrupt (spec.md §4.5).
    pub fn on_tx_complete(&self) {
        self.tx_done.signal();
    }

    /// Run one iteration of the consume loop: frame a line, match it
    /// against the handler table, invoke at most one handler (spec.md
    /// §4.2). A cooperative caller runs this in a `loop {}`; each call
    /// waits at most `line_timeout_ticks` for a line before returning.
    pub fn poll_once(&self, line_timeout_ticks: u64) {
        let mut line = [0u8; N];
        let n = match self.framer.next_line(&self.ring, &mut line, self.clock, line_timeout_ticks) {
            Some(n) => n,
            None => return,
        };
        self.dispatch_line(&line[..n]);
    }

    /// Run the consume loop forever. Never returns; intended for a board
    /// that dedicates a task to nothing else.
    pub fn run(&self, line_timeout_ticks: u64) -> ! {
        loop {
            self.poll_once(line_timeout_ticks);
        }
    }

    fn dispatch_line(&self, line: &[u8]) {
        let matched = {
            let mut guard = match self
                .handlers
                .lock_timeout(self.clock, self.handler_mutex_timeout_ticks())
            {
                Some(g) => g,
                None => {
                    log::warn!("handler-mutex timed out; dropping one line");
                    return;
                }
            };

            // Send-receive accumulation happens before matching, under the
            // same lock acquisition, so a handler invoked for this line
            // already sees it reflected in the accumulator (spec.md §5
            // "Ordering guarantees").
            guard.sr.accumulate(line);

            guard.table.find(line)
        };

        let (prefix_len, callback) = match matched {
            Some(m) => m,
            None => return,
        };

        let rest = skip_leading_whitespace(&line[prefix_len..]);
        match callback {
            Callback::External(handler) => handler.on_line(rest),
            Callback::SrMatched => self.sr_matched.signal(),
        }
    }
}

/// Skip leading SP/HT bytes, as spec.md §4.2 requires before a handler
/// sees the text following its matched prefix.
fn skip_leading_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != b' ' && b != b'\t').unwrap_or(bytes.len());
    &bytes[start..]
}

/// Shared fakes used by this module's tests and by `transmit`/`send_receive`'s.
#[cfg(test)]
pub(super) mod test_support {
    use crate::error::{Error, Result};
    use crate::handler_table::LineHandler;
    use crate::platform::SerialPort;
    use core::cell::RefCell;

    pub struct MockUart {
        pub dma_buf: [u8; 64],
        pub write_pos: usize,
        pub tx_log: RefCell<heapless::Vec<u8, 128>>,
        pub fail_tx: bool,
    }

    impl MockUart {
        pub fn new() -> Self {
            Self {
                dma_buf: [0u8; 64],
                write_pos: 0,
                tx_log: RefCell::new(heapless::Vec::new()),
                fail_tx: false,
            }
        }

        pub fn inject(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.dma_buf[self.write_pos] = b;
                self.write_pos = (self.write_pos + 1) % self.dma_buf.len();
            }
        }
    }

    impl SerialPort for MockUart {
        fn start_rx_dma(&mut self, _capacity: usize) {}
        fn dma_remaining(&self) -> usize {
            self.dma_buf.len() - self.write_pos
        }
        fn start_tx_dma(&mut self, bytes: &[u8]) -> Result<()> {
            if self.fail_tx {
                return Err(Error::SendFail);
            }
            self.tx_log.borrow_mut().extend_from_slice(bytes).ok();
            Ok(())
        }
        fn abort_tx(&mut self) {}
        fn abort_rx(&mut self) {}
    }

    pub struct RecordingHandler {
        pub seen: RefCell<heapless::Vec<u8, 64>>,
    }

    impl RecordingHandler {
        pub fn new() -> Self {
            Self {
                seen: RefCell::new(heapless::Vec::new()),
            }
        }
    }

    impl LineHandler for RecordingHandler {
        fn on_line(&self, rest: &[u8]) {
            self.seen.borrow_mut().extend_from_slice(rest).ok();
        }
    }
}
