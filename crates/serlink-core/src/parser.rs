//! Streaming frame parser.
//!
//! A byte-at-a-time state machine over an unbounded, noise-exposed octet
//! stream. Each byte costs O(1) work; all buffers are allocated once at
//! construction. Corruption never surfaces as an error: a bad checksum or
//! an oversized declared length drops the frame and the parser hunts for
//! the next start marker. An idle timeout (driven externally through
//! [`Parser::tick`]) abandons a partial frame whose sender went away
//! mid-transmission.
//!
//! The parser yields completed frames as return values instead of invoking
//! callbacks, which keeps it independent of the dispatch layer and directly
//! testable; [`crate::session::Session`] wires the two together.

use tracing::{debug, trace};

use crate::checksum::{Checksum, ChecksumKind};
use crate::codec::{Frame, FrameId, FrameType, ID_BYTES, LEN_BYTES, TYPE_BYTES};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Sof,
    Id,
    Len,
    Type,
    HeadCksum,
    Data,
    DataCksum,
}

/// Single-stream frame parser. At most one frame is in flight at a time.
#[derive(Debug)]
pub struct Parser {
    sof: Option<u8>,
    checksum: ChecksumKind,
    max_payload: usize,
    timeout_ticks: u32,

    state: State,
    /// Bytes collected so far in the current field, or payload bytes
    /// consumed while in the data state.
    collected: usize,
    /// Big-endian accumulator for the field currently being collected.
    /// Doubles as the reference checksum read off the wire in the two
    /// checksum states.
    field: u32,
    id: FrameId,
    len: usize,
    frame_type: FrameType,
    buf: Box<[u8]>,
    cksum: Checksum,
    discard: bool,
    idle_ticks: u32,
}

impl Parser {
    pub fn new(config: &Config) -> Self {
        let max_payload = config.effective_max_payload();
        Self {
            sof: config.sof,
            checksum: config.checksum,
            max_payload,
            timeout_ticks: config.timeout_ticks,
            state: State::Sof,
            collected: 0,
            field: 0,
            id: 0,
            len: 0,
            frame_type: 0,
            buf: vec![0u8; max_payload].into_boxed_slice(),
            cksum: Checksum::new(config.checksum),
            discard: false,
            idle_ticks: 0,
        }
    }

    /// Abandon any partial frame and return to start-marker hunting.
    pub fn reset(&mut self) {
        self.state = State::Sof;
    }

    /// Advance the idle counter, saturating at the timeout threshold.
    ///
    /// Must be driven on a roughly periodic cadence by the embedder's time
    /// source; granularity is the embedder's choice.
    pub fn tick(&mut self) {
        if self.idle_ticks < self.timeout_ticks {
            self.idle_ticks += 1;
        }
    }

    /// Consume one byte from the stream.
    ///
    /// Returns a completed, checksum-verified frame when this byte finished
    /// one. The returned frame borrows the parser's payload buffer and must
    /// be dropped before the next byte is pushed. Infallible: every parse
    /// failure is handled internally by resynchronization.
    pub fn push(&mut self, byte: u8) -> Option<Frame<'_>> {
        if self.timeout_ticks > 0 && self.idle_ticks >= self.timeout_ticks {
            if self.state != State::Sof {
                trace!("idle timeout, dropping partial frame");
            }
            self.reset();
        }
        self.idle_ticks = 0;

        if self.state == State::Sof {
            match self.sof {
                Some(marker) => {
                    if byte == marker {
                        self.begin_frame();
                    }
                    return None;
                }
                // No marker configured: this byte already belongs to the ID
                // field of the next frame.
                None => self.begin_frame(),
            }
        }

        match self.state {
            State::Sof => None,

            State::Id => {
                self.cksum.update(byte);
                if self.collect(byte, ID_BYTES) {
                    self.id = self.field as FrameId;
                    self.enter(State::Len);
                }
                None
            }

            State::Len => {
                self.cksum.update(byte);
                if self.collect(byte, LEN_BYTES) {
                    self.len = self.field as usize;
                    self.enter(State::Type);
                }
                None
            }

            State::Type => {
                self.cksum.update(byte);
                if self.collect(byte, TYPE_BYTES) {
                    self.frame_type = self.field as FrameType;
                    if self.checksum == ChecksumKind::None {
                        return self.begin_payload();
                    }
                    self.enter(State::HeadCksum);
                }
                None
            }

            State::HeadCksum => {
                if self.collect(byte, self.checksum.width()) {
                    if self.cksum.value() != self.field {
                        debug!(
                            id = self.id,
                            frame_type = self.frame_type,
                            "header checksum mismatch, resynchronizing"
                        );
                        self.reset();
                        return None;
                    }
                    return self.begin_payload();
                }
                None
            }

            State::Data => {
                if self.discard {
                    self.collected += 1;
                } else {
                    self.buf[self.collected] = byte;
                    self.collected += 1;
                    self.cksum.update(byte);
                }
                if self.collected == self.len {
                    if self.checksum == ChecksumKind::None {
                        self.reset();
                        if self.discard {
                            return None;
                        }
                        return Some(Frame {
                            id: self.id,
                            frame_type: self.frame_type,
                            payload: &self.buf[..self.len],
                        });
                    }
                    self.enter(State::DataCksum);
                }
                None
            }

            State::DataCksum => {
                if self.collect(byte, self.checksum.width()) {
                    let verified = !self.discard && self.cksum.value() == self.field;
                    self.reset();
                    if verified {
                        return Some(Frame {
                            id: self.id,
                            frame_type: self.frame_type,
                            payload: &self.buf[..self.len],
                        });
                    }
                    if !self.discard {
                        debug!(
                            id = self.id,
                            frame_type = self.frame_type,
                            "payload checksum mismatch, frame dropped"
                        );
                    }
                }
                None
            }
        }
    }

    /// Accumulate one big-endian byte into the current field; true when the
    /// field is complete.
    fn collect(&mut self, byte: u8, width: usize) -> bool {
        self.field = (self.field << 8) | u32::from(byte);
        self.collected += 1;
        self.collected == width
    }

    fn enter(&mut self, state: State) {
        self.state = state;
        self.collected = 0;
        self.field = 0;
    }

    /// A start marker was recognized (or, in markerless mode, the first
    /// byte of a new frame arrived).
    fn begin_frame(&mut self) {
        self.enter(State::Id);
        self.discard = false;
        self.cksum.reset();
        if let Some(marker) = self.sof {
            self.cksum.update(marker);
        }
    }

    /// Header complete and verified; decide how the payload phase runs.
    fn begin_payload(&mut self) -> Option<Frame<'_>> {
        if self.len == 0 {
            self.reset();
            return Some(Frame {
                id: self.id,
                frame_type: self.frame_type,
                payload: &[],
            });
        }
        self.enter(State::Data);
        self.cksum.reset();
        if self.len > self.max_payload {
            debug!(
                len = self.len,
                max = self.max_payload,
                "declared length exceeds capacity, discarding frame"
            );
            self.discard = true;
        }
        None
    }
}
