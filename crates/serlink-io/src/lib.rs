//! std I/O drivers for serlink sessions.
//!
//! The protocol core in `serlink-core` is I/O-free; this crate supplies its
//! three collaborators for std environments:
//! - [`StreamWire`] transmits composed frames over any `Write`,
//! - [`Pump`] feeds bytes from any `Read` into a session,
//! - [`Ticker`] drives the parser's idle timeout from wall-clock time.

pub mod error;
pub mod pump;
pub mod ticker;
pub mod wire;

pub use error::{LinkError, Result};
pub use pump::Pump;
pub use ticker::Ticker;
pub use wire::StreamWire;
