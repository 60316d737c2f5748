//! Synchronization primitives for the cooperative single-consumer model
//! described in spec.md §5. Everything here is built on plain atomics plus
//! a platform-supplied `Clock` for bounded waits — no architecture-specific
//! interrupt control lives in this crate (that stays with the integrator,
//! see `crate::platform`).

mod mutex;
mod signal;

pub use mutex::{Mutex, MutexGuard};
pub use signal::Signal;
