//! Typed, checksummed frame streaming for simplex byte links.
//!
//! serlink turns a raw octet stream (UART, radio, pipe) into discrete
//! frames (ID + type + payload, each protected by a header and a payload
//! checksum) and routes every completed frame to exactly one registered
//! listener. Outbound, it composes the same wire format. The parser works
//! byte at a time with O(1) cost per byte and bounded memory, recovers from
//! corruption by resynchronizing on the start marker, and abandons stalled
//! partial frames through an externally driven idle timeout.
//!
//! This crate is the protocol core and does no I/O: bytes come in through
//! [`Session::accept_buffer`], composed frames go out through the
//! [`WireTx`] collaborator, and time arrives through [`Session::tick`].
//! The `serlink-io` crate provides std `Read`/`Write` drivers for all
//! three.

pub mod checksum;
pub mod codec;
pub mod config;
pub mod error;
pub mod id;
pub mod parser;
pub mod registry;
pub mod session;

pub use checksum::{Checksum, ChecksumKind};
pub use codec::{
    encode_frame, frame_overhead, wire_size, Frame, FrameId, FrameLen, FrameType, ID_BYTES,
    LEN_BYTES, TYPE_BYTES,
};
pub use config::{Config, DEFAULT_MAX_PAYLOAD, DEFAULT_SOF};
pub use error::{FrameError, Result};
pub use id::{IdGen, Peer, ID_MASK, PEER_BIT};
pub use parser::Parser;
pub use registry::{Listener, Registry};
pub use session::{NullWire, Responder, Session, WireTx};
