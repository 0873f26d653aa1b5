use std::io::{ErrorKind, Write};

use tracing::warn;

use serlink_core::WireTx;

use crate::error::LinkError;

/// Drives composed frames into any `Write` stream.
///
/// [`WireTx`] is fire-and-forget (the protocol core never observes a
/// transmit result), so write failures are logged and parked in
/// [`StreamWire::last_error`] for the embedder to inspect between calls.
pub struct StreamWire<T> {
    inner: T,
    last_error: Option<LinkError>,
}

impl<T: Write> StreamWire<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            last_error: None,
        }
    }

    /// The most recent transmit failure, if any.
    pub fn last_error(&self) -> Option<&LinkError> {
        self.last_error.as_ref()
    }

    /// Take and clear the most recent transmit failure.
    pub fn take_last_error(&mut self) -> Option<LinkError> {
        self.last_error.take()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the wire and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn write_all_frame(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        let mut offset = 0usize;
        while offset < frame.len() {
            match self.inner.write(&frame[offset..]) {
                Ok(0) => return Err(LinkError::Closed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(LinkError::Io(err)),
            }
        }

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(LinkError::Io(err)),
            }
        }
    }
}

impl<T: Write> WireTx for StreamWire<T> {
    fn tx(&mut self, frame: &[u8]) {
        if let Err(err) = self.write_all_frame(frame) {
            warn!(error = %err, len = frame.len(), "wire write failed, frame dropped");
            self.last_error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_frame_bytes_through() {
        let mut wire = StreamWire::new(Vec::new());
        wire.tx(&[1, 2, 3]);
        wire.tx(&[4]);

        assert!(wire.last_error().is_none());
        assert_eq!(wire.into_inner(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn retries_interrupted_and_would_block() {
        struct Flaky {
            hiccups: u8,
            data: Vec<u8>,
        }

        impl Write for Flaky {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                if self.hiccups > 0 {
                    self.hiccups -= 1;
                    let kind = if self.hiccups % 2 == 0 {
                        ErrorKind::Interrupted
                    } else {
                        ErrorKind::WouldBlock
                    };
                    return Err(std::io::Error::from(kind));
                }
                // One byte at a time, to exercise the offset loop too.
                self.data.push(buf[0]);
                Ok(1)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut wire = StreamWire::new(Flaky {
            hiccups: 3,
            data: Vec::new(),
        });
        wire.tx(&[9, 8, 7]);

        assert!(wire.last_error().is_none());
        assert_eq!(wire.get_ref().data, vec![9, 8, 7]);
    }

    #[test]
    fn zero_write_marks_link_closed() {
        struct Dead;

        impl Write for Dead {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut wire = StreamWire::new(Dead);
        wire.tx(&[1]);

        assert!(matches!(wire.take_last_error(), Some(LinkError::Closed)));
        assert!(wire.last_error().is_none());
    }

    #[test]
    fn hard_error_is_recorded_not_raised() {
        struct Broken;

        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(ErrorKind::BrokenPipe))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut wire = StreamWire::new(Broken);
        wire.tx(&[1]);

        assert!(matches!(
            wire.last_error(),
            Some(LinkError::Io(err)) if err.kind() == ErrorKind::BrokenPipe
        ));
    }
}
