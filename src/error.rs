//! Crate-wide error type for the dispatcher surface (spec.md §6.2).
//!
//! Implemented with `thiserror`, already a pinned dependency of the
//! teacher kernel (`Cargo.toml`: `thiserror = { version = "2",
//! default-features = false }`) for exactly this ambient concern, rather
//! than hand-rolling `Display`/`core::error::Error` the way the crate's
//! older modules do (see e.g. `hermit::drivers::error::DriverError`).

use num_enum::IntoPrimitive;

/// Errors returned by the dispatcher's init, registration, send, and
/// send-receive operations. Parser errors live in their own, disjoint
/// `parser::ParseError` (spec.md §6.2 draws the same distinction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, thiserror::Error)]
#[repr(u8)]
pub enum Error {
    #[error("argument is invalid for this operation")]
    InvalidArg = 1,
    #[error("resource is busy")]
    Busy = 2,
    #[error("no resource available (e.g. handler table full)")]
    Resource = 3,
    #[error("peripheral initialization failed")]
    InitFail = 4,
    #[error("no matching registration found")]
    NotFound = 5,
    #[error("transmit failed")]
    SendFail = 6,
    #[error("operation timed out")]
    Timeout = 7,
    #[error("internal invariant violated")]
    Internal = 8,
}

pub type Result<T> = core::result::Result<T, Error>;
