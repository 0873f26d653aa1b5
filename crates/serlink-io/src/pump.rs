use std::io::{ErrorKind, Read};

use serlink_core::{Session, WireTx};

use crate::error::Result;
use crate::ticker::Ticker;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Feeds a `Read` stream into a session, chunk by chunk.
///
/// The session's parser does not care where chunk boundaries fall, so the
/// pump just moves whatever each read returns. An attached [`Ticker`]
/// advances the parser's idle timeout between reads.
pub struct Pump<T> {
    inner: T,
    ticker: Option<Ticker>,
}

impl<T: Read> Pump<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            ticker: None,
        }
    }

    /// Attach a wall-clock tick source, driven before every read.
    pub fn with_ticker(mut self, ticker: Ticker) -> Self {
        self.ticker = Some(ticker);
        self
    }

    /// Read one chunk and feed it to the session.
    ///
    /// Returns the chunk size, or `None` at end of stream. Interrupted
    /// reads are retried.
    pub fn step<W: WireTx>(&mut self, session: &mut Session<W>) -> Result<Option<usize>> {
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.advance(session);
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    session.accept_buffer(&chunk[..n]);
                    return Ok(Some(n));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Drive the session until end of stream. Returns total bytes fed.
    pub fn run<W: WireTx>(&mut self, session: &mut Session<W>) -> Result<u64> {
        let mut total = 0u64;
        while let Some(n) = self.step(session)? {
            total += n as u64;
        }
        Ok(total)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the pump and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
