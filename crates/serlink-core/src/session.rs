//! Caller-owned protocol session.
//!
//! A [`Session`] bundles one parser, one listener registry and one outbound
//! path over a single link. Sessions are plain values: open several for
//! several links, and hand each to whatever owns that link. Everything runs
//! on the caller's thread: byte ingestion, tick advancement and sends are
//! ordinary synchronous calls, and listeners execute inline on the call
//! stack of the byte that completed their frame.
//!
//! Sending from inside a listener is a supported pattern (synchronous
//! request/response): the listener is lent a [`Responder`] that borrows
//! only the outbound half of the session, disjoint from the parser buffer
//! holding the frame being read. Feeding bytes or editing the listener
//! tables from inside a listener is not representable, by construction.

use bytes::BytesMut;

use crate::codec::{encode_frame, frame_overhead, FrameId, FrameType};
use crate::config::Config;
use crate::error::{FrameError, Result};
use crate::id::IdGen;
use crate::parser::Parser;
use crate::registry::{Listener, Registry};

/// Transport-write collaborator.
///
/// Receives each fully composed frame. Fire-and-forget: the protocol core
/// never observes a transmit result; a transport that can fail should
/// record or log it on its own terms.
pub trait WireTx {
    fn tx(&mut self, frame: &[u8]);
}

/// A wire that discards everything. For receive-only sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullWire;

impl WireTx for NullWire {
    fn tx(&mut self, _frame: &[u8]) {}
}

/// Outbound half of a session, lent to listeners during dispatch.
pub struct Responder<'a, W> {
    config: &'a Config,
    ids: &'a mut IdGen,
    staging: &'a mut BytesMut,
    wire: &'a mut W,
}

impl<'a, W> Responder<'a, W> {
    pub(crate) fn new(
        config: &'a Config,
        ids: &'a mut IdGen,
        staging: &'a mut BytesMut,
        wire: &'a mut W,
    ) -> Self {
        Self {
            config,
            ids,
            staging,
            wire,
        }
    }
}

impl<W: WireTx> Responder<'_, W> {
    /// Compose and transmit a frame under a freshly allocated ID.
    pub fn send(&mut self, frame_type: FrameType, payload: &[u8]) -> Result<FrameId> {
        let id = self.ids.next();
        self.transmit(id, frame_type, payload)?;
        Ok(id)
    }

    /// Compose and transmit a frame under an explicit ID, correlating it
    /// to a previously received frame.
    pub fn respond(&mut self, frame_type: FrameType, payload: &[u8], id: FrameId) -> Result<()> {
        self.transmit(id, frame_type, payload)
    }

    fn transmit(&mut self, id: FrameId, frame_type: FrameType, payload: &[u8]) -> Result<()> {
        self.staging.clear();
        encode_frame(self.config, id, frame_type, payload, self.staging)?;
        self.wire.tx(self.staging.as_ref());
        Ok(())
    }
}

/// One framing session over one link.
pub struct Session<W> {
    config: Config,
    parser: Parser,
    registry: Registry<W>,
    ids: IdGen,
    staging: BytesMut,
    wire: W,
}

impl<W> Session<W> {
    /// Open a session. All buffers and tables are allocated here, once;
    /// steady-state operation does not allocate.
    pub fn new(config: Config, wire: W) -> Self {
        let staging =
            BytesMut::with_capacity(frame_overhead(&config) + config.effective_max_payload());
        Self {
            parser: Parser::new(&config),
            registry: Registry::new(&config),
            ids: IdGen::new(config.peer),
            staging,
            config,
            wire,
        }
    }

    /// Advance the parser's idle counter. Drive this from the embedder's
    /// time source on a roughly periodic cadence.
    pub fn tick(&mut self) {
        self.parser.tick();
    }

    /// Abandon any partially parsed frame.
    pub fn reset(&mut self) {
        self.parser.reset();
    }

    /// Register a listener for one frame ID. `false` when the table is full.
    pub fn add_id_listener(&mut self, id: FrameId, listener: Listener<W>) -> bool {
        self.registry.add_id_listener(id, listener)
    }

    /// Register a listener for one message type. `false` when full.
    pub fn add_type_listener(&mut self, frame_type: FrameType, listener: Listener<W>) -> bool {
        self.registry.add_type_listener(frame_type, listener)
    }

    /// Register a catch-all listener. `false` when full.
    pub fn add_generic_listener(&mut self, listener: Listener<W>) -> bool {
        self.registry.add_generic_listener(listener)
    }

    /// Remove the listener registered for `id`. `false` if none is.
    pub fn remove_id_listener(&mut self, id: FrameId) -> bool {
        self.registry.remove_id_listener(id)
    }

    /// Remove the listener registered for `frame_type`. `false` if none is.
    pub fn remove_type_listener(&mut self, frame_type: FrameType) -> bool {
        self.registry.remove_type_listener(frame_type)
    }

    /// Remove the oldest registered generic listener. `false` if none is.
    pub fn remove_generic_listener(&mut self) -> bool {
        self.registry.remove_generic_listener()
    }

    /// Session configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Borrow the wire collaborator.
    pub fn get_ref(&self) -> &W {
        &self.wire
    }

    /// Mutably borrow the wire collaborator.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.wire
    }

    /// Consume the session and return the wire collaborator.
    pub fn into_inner(self) -> W {
        self.wire
    }
}

impl<W: WireTx> Session<W> {
    /// Consume one received byte. Completed, verified frames are routed to
    /// the listeners inline. Infallible: parse errors resolve internally by
    /// resynchronization.
    pub fn accept(&mut self, byte: u8) {
        if let Some(frame) = self.parser.push(byte) {
            let mut responder = Responder::new(
                &self.config,
                &mut self.ids,
                &mut self.staging,
                &mut self.wire,
            );
            self.registry.dispatch(&mut responder, frame);
        }
    }

    /// Consume a chunk of received bytes. Frame boundaries need not align
    /// with chunk boundaries.
    pub fn accept_buffer(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.accept(byte);
        }
    }

    /// Compose and transmit a frame under a freshly allocated ID.
    pub fn send(&mut self, frame_type: FrameType, payload: &[u8]) -> Result<FrameId> {
        let id = self.ids.next();
        self.transmit(id, frame_type, payload)?;
        Ok(id)
    }

    /// Send a request and register `on_reply` for the allocated ID.
    ///
    /// The reply listener is one-shot: it is removed once it claims a
    /// frame. Fails without transmitting when the ID table has no free
    /// slot, so a caller never waits on a correlation that was never armed.
    pub fn send_with_reply(
        &mut self,
        frame_type: FrameType,
        payload: &[u8],
        on_reply: Listener<W>,
    ) -> Result<FrameId> {
        let id = self.ids.next();
        self.staging.clear();
        encode_frame(&self.config, id, frame_type, payload, &mut self.staging)?;
        if !self.registry.add_id_listener(id, on_reply) {
            return Err(FrameError::ListenerTableFull {
                capacity: self.config.id_listeners,
            });
        }
        self.wire.tx(self.staging.as_ref());
        Ok(id)
    }

    /// Compose and transmit a frame under an explicit ID (a reply).
    pub fn respond(&mut self, frame_type: FrameType, payload: &[u8], id: FrameId) -> Result<()> {
        self.transmit(id, frame_type, payload)
    }

    fn transmit(&mut self, id: FrameId, frame_type: FrameType, payload: &[u8]) -> Result<()> {
        self.staging.clear();
        encode_frame(&self.config, id, frame_type, payload, &mut self.staging)?;
        self.wire.tx(self.staging.as_ref());
        Ok(())
    }
}
