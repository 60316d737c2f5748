//! C7: the transmitter (spec.md §4.5).

use crate::config::{LINE_TERMINATOR, TX_MUTEX_TIMEOUT_MS, TX_TIMEOUT_MS};
use crate::error::{Error, Result};
use crate::platform::{Clock, SerialPort};

use super::Dispatcher;

impl<'a, S, C, const N: usize, const D: usize, const T: usize> Dispatcher<'a, S, C, N, D, T>
where
    S: SerialPort,
    C: Clock,
{
    /// Serialize one outbound line: acquire tx-mutex, format `cmd` plus the
    /// line terminator into the scratch buffer, hand it to the peripheral,
    /// and wait for the TX-complete ISR to signal completion.
    pub fn send(&self, cmd: &[u8]) -> Result<()> {
        let timeout_ticks = self.clock.ticks_per_ms().saturating_mul(TX_MUTEX_TIMEOUT_MS);
        let mut tx = self.tx.lock_timeout(self.clock, timeout_ticks).ok_or(Error::Busy)?;

        tx.scratch.clear();
        tx.scratch.extend_from_slice(cmd).map_err(|_| Error::InvalidArg)?;
        tx.scratch
            .extend_from_slice(LINE_TERMINATOR)
            .map_err(|_| Error::InvalidArg)?;

        if tx.uart.start_tx_dma(&tx.scratch).is_err() {
            return Err(Error::SendFail);
        }

        let wait_ticks = self.clock.ticks_per_ms().saturating_mul(TX_TIMEOUT_MS);
        if self.tx_done.wait(self.clock, Some(wait_ticks)) {
            Ok(())
        } else {
            Err(Error::Timeout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::MockUart;
    use super::super::Dispatcher;
    use crate::platform::tests::FakeClock;

    type TestDispatcher<'a> = Dispatcher<'a, MockUart, FakeClock, 128, 64, 64>;

    #[test]
    fn send_formats_line_terminator_and_waits_for_tx_done() {
        let clock = FakeClock::new();
        let uart = MockUart::new();
        let d: TestDispatcher = Dispatcher::new(uart, &clock);

        // Nothing signals tx-done on its own; simulate the ISR firing
        // right away so `send` doesn't have to wait out the real timeout.
        d.on_tx_complete();
        d.send(b"AT+CREG?").unwrap();

        let tx = d.tx.try_lock().unwrap();
        assert_eq!(&tx.uart.tx_log.borrow()[..], b"AT+CREG?\r\n");
    }

    #[test]
    fn send_reports_invalid_arg_when_command_does_not_fit_scratch() {
        let clock = FakeClock::new();
        let uart = MockUart::new();
        let d: Dispatcher<'_, MockUart, FakeClock, 128, 64, 4> = Dispatcher::new(uart, &clock);
        assert_eq!(d.send(b"this won't fit"), Err(crate::error::Error::InvalidArg));
    }

    #[test]
    fn send_propagates_immediate_peripheral_failure() {
        let clock = FakeClock::new();
        let mut uart = MockUart::new();
        uart.fail_tx = true;
        let d: TestDispatcher = Dispatcher::new(uart, &clock);
        assert_eq!(d.send(b"AT"), Err(crate::error::Error::SendFail));
    }

    #[test]
    fn send_times_out_when_tx_done_never_fires() {
        let clock = FakeClock::new();
        let uart = MockUart::new();
        let d: TestDispatcher = Dispatcher::new(uart, &clock);
        assert_eq!(d.send(b"AT"), Err(crate::error::Error::Timeout));
    }
}
