//! A busy-waiting mutual-exclusion lock for the cooperative, single-core
//! scheduling model this crate assumes (spec.md §5): at most one task ever
//! runs at a time, so contention only happens across explicit yield points,
//! never concurrently with an ISR (ISRs never take this lock).
//!
//! Derived from the ticket-lock shape of `hermit::synch::spinlock::Spinlock`,
//! narrowed to the single-core case and extended with a deadline-bounded
//! acquire so callers can honor spec.md's "acquire with a short timeout"
//! requirement for the handler-mutex and tx-mutex.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::platform::Clock;

/// A lock guarding `T`, acquired via a bounded or unbounded busy-wait.
pub struct Mutex<T: ?Sized> {
    queue: AtomicUsize,
    dequeue: AtomicUsize,
    data: UnsafeCell<T>,
}

// SAFETY: the ticket lock below admits exactly one `MutexGuard` at a time,
// so `&Mutex<T>` across threads never yields concurrent access to `data`.
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}

/// RAII guard returned by a successful acquire. Releases the lock on drop.
pub struct MutexGuard<'a, T: ?Sized> {
    mutex: &'a Mutex<T>,
    ticket: usize,
}

impl<T> Mutex<T> {
    pub const fn new(data: T) -> Self {
        Self {
            queue: AtomicUsize::new(0),
            dequeue: AtomicUsize::new(1),
            data: UnsafeCell::new(data),
        }
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Acquire the lock if it is immediately free; never waits.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
        self.queue
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |ticket| {
                if self.dequeue.load(Ordering::Acquire) == ticket + 1 {
                    Some(ticket + 1)
                } else {
                    None
                }
            })
            .ok()
            // `fetch_update` hands back the pre-increment queue value; the
            // guard stores the post-increment ticket (the same 1-indexed
            // numbering `dequeue` is compared against), so `Drop` below
            // always advances `dequeue` past the slot this guard actually
            // holds instead of re-storing the value it already was.
            .map(|ticket| MutexGuard {
                mutex: self,
                ticket: ticket + 1,
            })
    }

    /// Acquire the lock, blocking cooperatively (via `clock.yield_now`)
    /// until it becomes free. Used for the send-receive cleanup path,
    /// which spec.md §4.4 step 4 requires to "reacquire handler-mutex
    /// (blocking indefinitely)".
    pub fn lock(&self, clock: &dyn Clock) -> MutexGuard<'_, T> {
        loop {
            if let Some(guard) = self.try_lock() {
                return guard;
            }
            clock.yield_now();
        }
    }

    /// Acquire the lock, giving up once `timeout_ticks` have elapsed.
    /// `timeout_ticks == 0` degenerates to a single `try_lock` attempt.
    pub fn lock_timeout(&self, clock: &dyn Clock, timeout_ticks: u64) -> Option<MutexGuard<'_, T>> {
        let deadline = clock.now_ticks().saturating_add(timeout_ticks);
        loop {
            if let Some(guard) = self.try_lock() {
                return Some(guard);
            }
            if clock.now_ticks() >= deadline {
                return None;
            }
            clock.yield_now();
        }
    }
}

impl<T: ?Sized + Default> Default for Mutex<T> {
    fn default() -> Self {
        Mutex::new(T::default())
    }
}

impl<'a, T: ?Sized> Deref for MutexGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        // SAFETY: holding this guard means the ticket lock is held.
        unsafe { &*self.mutex.data.get() }
    }
}

impl<'a, T: ?Sized> DerefMut for MutexGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: holding this guard means the ticket lock is held.
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<'a, T: ?Sized> Drop for MutexGuard<'a, T> {
    fn drop(&mut self) {
        self.mutex.dequeue.store(self.ticket + 1, Ordering::Release);
    }
}
