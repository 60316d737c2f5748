//! An interrupt-driven AT-command dispatcher for a UART-attached modem.
//!
//! The crate owns the boundary between an idle-line/TX-complete ISR pair
//! feeding a byte ring and a single cooperative task that frames lines,
//! matches them against registered handlers, and drives synchronous
//! request/response exchanges. It does not own a UART driver, a DMA
//! controller, or a task scheduler — those are supplied by the
//! integrating board crate through the [`platform`] traits.
//!
//! ```text
//! ISR (idle-line)  ──▶ DmaCapture ──▶ ByteRing ──▶ LineFramer ──▶ Dispatcher ──▶ handler / send_receive
//! ISR (TX-complete)───────────────────────────────────────────────────────▶ Dispatcher::on_tx_complete
//! ```
//!
//! # Example
//!
//! ```ignore
//! static CLOCK: MyClock = MyClock::new();
//! static DISPATCHER: Dispatcher<MyUart, MyClock, 512, 512, 512> =
//!     Dispatcher::new(MyUart::new(), &CLOCK);
//!
//! DISPATCHER.init()?;
//! DISPATCHER.register_urc(b"+CREG", &creg_handler)?;
//! DISPATCHER.send_receive(b"AT", b"OK", &mut buf, 1000)?;
//! ```

#![cfg_attr(not(test), no_std)]

pub mod byte_ring;
pub mod config;
pub mod dispatcher;
pub mod dma_capture;
pub mod error;
pub mod handler_table;
pub mod line_framer;
pub mod parser;
pub mod platform;
pub mod sync;

pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use handler_table::LineHandler;
pub use platform::{Clock, SerialPort};
