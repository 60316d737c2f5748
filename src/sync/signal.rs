//! A binary signal: set from ISR context with a single non-blocking store,
//! waited on cooperatively from task context with a bounded timeout.
//!
//! The `wait` signature is lifted directly from
//! `hermit::synch::semaphore::Semaphore::acquire(time: Option<u64>) -> bool`,
//! narrowed from a counting semaphore with a priority wait queue (which
//! needs a real task scheduler) to the binary case spec.md §3 calls for
//! (`tx-done`, `sr-matched`), polling a `Clock` deadline instead of parking
//! on a scheduler run queue.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::platform::Clock;

pub struct Signal {
    flag: AtomicBool,
}

impl Signal {
    pub const fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
        }
    }

    /// Fire the signal. A single atomic store, never blocks — safe to call
    /// from ISR context (e.g. tx-done) or from task context (e.g. the
    /// sr-matched sentinel handler in `crate::dispatcher`).
    pub fn signal(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Clear any pending signal without waiting. Used before starting a
    /// new send-receive so a stale signal from a previous request cannot
    /// be mistaken for this one (spec.md §4.4 step 1: "Drain any pending
    /// signal on sr-matched").
    pub fn drain(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    /// Wait for the signal, consuming it on success. `timeout_ticks` of
    /// `None` waits forever; `Some(0)` polls once.
    pub fn wait(&self, clock: &dyn Clock, timeout_ticks: Option<u64>) -> bool {
        let deadline = timeout_ticks.map(|t| clock.now_ticks().saturating_add(t));
        loop {
            if self
                .flag
                .compare_exchange(true, false, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
            if let Some(deadline) = deadline {
                if clock.now_ticks() >= deadline {
                    return false;
                }
            }
            clock.yield_now();
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}
