//! Compile-time defaults from spec.md §6.4, kept as plain `pub const`s in
//! a dedicated module rather than scattering magic numbers through the
//! implementation.
//!
//! The `large-buffers` Cargo feature widens the buffers for boards with
//! more RAM than a typical Cortex-M0 target, without changing any of the
//! protocol-level constants.

/// Capacity of the byte ring (C1) fed by the ISR producer.
#[cfg(not(feature = "large-buffers"))]
pub const RX_RING_CAPACITY: usize = 512;
#[cfg(feature = "large-buffers")]
pub const RX_RING_CAPACITY: usize = 4096;

/// Size of the transmit scratch buffer (C7), including the appended CRLF.
#[cfg(not(feature = "large-buffers"))]
pub const TX_SCRATCH_CAPACITY: usize = 512;
#[cfg(feature = "large-buffers")]
pub const TX_SCRATCH_CAPACITY: usize = 4096;

/// Capacity of the hardware DMA ring the integrator's peripheral driver
/// fills (`D` in spec.md §3).
#[cfg(not(feature = "large-buffers"))]
pub const DMA_RING_CAPACITY: usize = 512;
#[cfg(feature = "large-buffers")]
pub const DMA_RING_CAPACITY: usize = 4096;

/// Maximum number of simultaneously registered handlers (C4).
pub const MAX_HANDLERS: usize = 10;

/// Cap on waiting for tx-done after handing a buffer to the peripheral (C7).
pub const TX_TIMEOUT_MS: u64 = 1000;

/// Cap on acquiring tx-mutex (C7).
pub const TX_MUTEX_TIMEOUT_MS: u64 = 500;

/// Cap on acquiring handler-mutex from the dispatch loop (C5). Spec.md
/// §4.2 calls this "100 ms"; kept as its own constant (rather than reusing
/// `TX_MUTEX_TIMEOUT_MS`) because the two are conceptually independent,
/// even though they happen to share an order of magnitude.
pub const HANDLER_MUTEX_TIMEOUT_MS: u64 = 100;

/// The two-byte sequence that frames lines in both directions (C3, §6.3).
pub const LINE_TERMINATOR: &[u8] = b"\r\n";
