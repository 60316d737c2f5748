//! C6: the send-receive coordinator (spec.md §4.4).
//!
//! The crate has exactly one cooperative task (spec.md §5 "scheduling
//! model"), and that task is whichever caller happens to be running —
//! there is no separate thread pumping the dispatch loop while
//! `send_receive` waits. So the wait step below does the dispatch loop's
//! job itself: frame a line, dispatch it, check sr-matched, repeat. This
//! is the same discipline `Dispatcher::run` uses; `send_receive` just
//! inlines one more exit condition into it.

use crate::error::{Error, Result};
use crate::handler_table::Callback;
use crate::platform::{Clock, SerialPort};

use super::Dispatcher;

impl<'a, S, C, const N: usize, const D: usize, const T: usize> Dispatcher<'a, S, C, N, D, T>
where
    S: SerialPort,
    C: Clock,
{
    /// One-shot synchronous request/response. Transmits `cmd`, accumulates
    /// every line seen until one starts with `expected` (or `timeout_ticks`
    /// elapses) into `out`, and unregisters its temporary hook either way.
    pub fn send_receive(
        &self,
        cmd: &[u8],
        expected: &'a [u8],
        out: &mut [u8],
        timeout_ticks: u64,
    ) -> Result<()> {
        if out.is_empty() {
            return Err(Error::InvalidArg);
        }

        {
            let mut guard = self
                .handlers
                .lock_timeout(self.clock, self.handler_mutex_timeout_ticks())
                .ok_or(Error::Busy)?;
            if guard.sr.active {
                return Err(Error::Busy);
            }
            guard.sr.active = true;
            guard.sr.out_ptr = out.as_mut_ptr();
            guard.sr.cap = out.len();
            guard.sr.len = 0;
            out[0] = 0;

            if guard.table.register_callback(expected, Callback::SrMatched).is_err() {
                guard.sr.active = false;
                return Err(Error::Internal);
            }
            self.sr_matched.drain();
        }

        if self.send(cmd).is_err() {
            self.sr_cleanup(expected);
            return Err(Error::SendFail);
        }

        let deadline = self.clock.now_ticks().saturating_add(timeout_ticks);
        let matched = self.pump_until_signaled(deadline);

        self.sr_cleanup(expected);

        if matched {
            Ok(())
        } else {
            Err(Error::Timeout)
        }
    }

    /// Drive the dispatch loop — frame and dispatch whatever lines are
    /// available — until sr-matched fires or `deadline` passes.
    fn pump_until_signaled(&self, deadline: u64) -> bool {
        loop {
            let mut line = [0u8; N];
            if let Some(n) = self.framer.next_line(&self.ring, &mut line, self.clock, 0) {
                self.dispatch_line(&line[..n]);
            }
            if self.sr_matched.wait(self.clock, Some(0)) {
                return true;
            }
            if self.clock.now_ticks() >= deadline {
                return false;
            }
            self.clock.yield_now();
        }
    }

    /// Step 4: reacquire handler-mutex (blocking indefinitely, per
    /// spec.md §4.4), unregister the temporary entry, free the slot.
    fn sr_cleanup(&self, expected: &[u8]) {
        let mut guard = self.handlers.lock(self.clock);
        let _ = guard.table.unregister(expected);
        guard.sr.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::MockUart;
    use super::super::Dispatcher;
    use crate::error::Error;
    use crate::platform::tests::FakeClock;

    type TestDispatcher<'a> = Dispatcher<'a, MockUart, FakeClock, 256, 64, 64>;

    #[test]
    fn end_to_end_send_receive_collects_lines_up_to_expected() {
        let clock = FakeClock::new();
        let uart = MockUart::new();
        let d: TestDispatcher = Dispatcher::new(uart, &clock);

        d.ring.push_from_isr(b"Manufacturer: X\r\nModel: Y\r\nOK\r\n");
        d.on_tx_complete();

        let mut out = [0u8; 256];
        let result = d.send_receive(b"ATI", b"OK", &mut out, 1000);

        assert!(result.is_ok());
        let text = core::str::from_utf8(&out[..out.iter().position(|&b| b == 0).unwrap()]).unwrap();
        assert_eq!(text, "Manufacturer: X\r\nModel: Y\r\nOK\r\n");
    }

    #[test]
    fn times_out_when_expected_prefix_never_arrives() {
        let clock = FakeClock::new();
        let uart = MockUart::new();
        let d: TestDispatcher = Dispatcher::new(uart, &clock);
        d.on_tx_complete();

        let mut out = [0u8; 64];
        let result = d.send_receive(b"AT", b"OK", &mut out, 5);
        assert_eq!(result, Err(Error::Timeout));
    }

    #[test]
    fn rejects_a_second_concurrent_send_receive() {
        let clock = FakeClock::new();
        let uart = MockUart::new();
        let d: TestDispatcher = Dispatcher::new(uart, &clock);

        let mut first_out = [0u8; 64];
        {
            let mut guard = d.handlers.lock(&clock);
            guard.sr.active = true;
        }
        let result = d.send_receive(b"AT", b"OK", &mut first_out, 10);
        assert_eq!(result, Err(Error::Busy));
    }

    #[test]
    fn cleanup_unregisters_expected_prefix_after_timeout() {
        let clock = FakeClock::new();
        let uart = MockUart::new();
        let d: TestDispatcher = Dispatcher::new(uart, &clock);
        d.on_tx_complete();

        let mut out = [0u8; 64];
        assert_eq!(d.send_receive(b"AT", b"OK", &mut out, 3), Err(Error::Timeout));

        let mut guard = d.handlers.lock(&clock);
        assert!(guard.table.find(b"OK\r\n").is_none());
        assert!(!guard.sr.active);
    }
}
