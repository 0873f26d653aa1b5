//! Wire format and frame composition.
//!
//! Every frame is laid out as:
//!
//! ```text
//! ┌───────┬─────────┬──────────┬──────────┬────────────┬──────────┬────────────┐
//! │ SOF?  │ ID      │ LEN      │ TYPE     │ HEAD_CKSUM?│ PAYLOAD  │ DATA_CKSUM?│
//! │ (1B)  │ (2B BE) │ (2B BE)  │ (1B)     │ (0-4B BE)  │ LEN bytes│ (0-4B BE)  │
//! └───────┴─────────┴──────────┴──────────┴────────────┴──────────┴────────────┘
//! ```
//!
//! The start-of-frame marker is optional, the checksum fields are sized by
//! the selected [`ChecksumKind`] and omitted entirely in mode `None`, and a
//! zero-length frame ends right after the header checksum. The header
//! checksum covers the SOF marker (when present), ID, LEN and TYPE; the
//! payload checksum covers the payload bytes only.

use bytes::{BufMut, BytesMut};

use crate::checksum::{Checksum, ChecksumKind};
use crate::config::Config;
use crate::error::{FrameError, Result};

/// Frame ID field. The top bit carries the peer identity.
pub type FrameId = u16;
/// Payload length field.
pub type FrameLen = u16;
/// Message type field.
pub type FrameType = u8;

/// Wire width of the ID field.
pub const ID_BYTES: usize = FrameId::BITS as usize / 8;
/// Wire width of the LEN field.
pub const LEN_BYTES: usize = FrameLen::BITS as usize / 8;
/// Wire width of the TYPE field.
pub const TYPE_BYTES: usize = FrameType::BITS as usize / 8;

/// A completed frame, borrowed from the parser's buffer during dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Correlation ID (peer bit included).
    pub id: FrameId,
    /// Application message type.
    pub frame_type: FrameType,
    /// Payload bytes.
    pub payload: &'a [u8],
}

/// Worst-case non-payload bytes of a frame under `config`.
///
/// A destination buffer of `frame_overhead(config) + config.max_payload`
/// bytes fits any composable frame.
pub fn frame_overhead(config: &Config) -> usize {
    usize::from(config.sof.is_some())
        + ID_BYTES
        + LEN_BYTES
        + TYPE_BYTES
        + 2 * config.checksum.width()
}

/// Exact wire size of a frame with a `payload_len`-byte payload.
pub fn wire_size(config: &Config, payload_len: usize) -> usize {
    let header = usize::from(config.sof.is_some())
        + ID_BYTES
        + LEN_BYTES
        + TYPE_BYTES
        + config.checksum.width();
    if payload_len == 0 {
        header
    } else {
        header + payload_len + config.checksum.width()
    }
}

/// Big-endian bytes of `value`, most significant first, `width` bytes wide.
fn be_bytes(value: u32, width: usize) -> impl Iterator<Item = u8> {
    (0..width).rev().map(move |shift| (value >> (shift * 8)) as u8)
}

/// Encode a frame into the wire format, appending to `dst`.
///
/// Returns the number of bytes written. Fails with
/// [`FrameError::PayloadTooLarge`] before writing anything when the payload
/// exceeds the configured maximum.
pub fn encode_frame(
    config: &Config,
    id: FrameId,
    frame_type: FrameType,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<usize> {
    let max = config.effective_max_payload();
    if payload.len() > max {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max,
        });
    }

    let start = dst.len();
    dst.reserve(frame_overhead(config) + payload.len());

    let mut cksum = Checksum::new(config.checksum);
    if let Some(marker) = config.sof {
        dst.put_u8(marker);
        cksum.update(marker);
    }
    for byte in be_bytes(u32::from(id), ID_BYTES)
        .chain(be_bytes(payload.len() as u32, LEN_BYTES))
        .chain(be_bytes(u32::from(frame_type), TYPE_BYTES))
    {
        dst.put_u8(byte);
        cksum.update(byte);
    }
    if config.checksum != ChecksumKind::None {
        for byte in be_bytes(cksum.value(), config.checksum.width()) {
            dst.put_u8(byte);
        }
    }

    if !payload.is_empty() {
        cksum.reset();
        for &byte in payload {
            cksum.update(byte);
        }
        dst.put_slice(payload);
        if config.checksum != ChecksumKind::None {
            for byte in be_bytes(cksum.value(), config.checksum.width()) {
                dst.put_u8(byte);
            }
        }
    }

    Ok(dst.len() - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_wire_bytes_xor8() {
        let config = Config {
            checksum: ChecksumKind::Xor8,
            ..Config::default()
        };
        let mut wire = BytesMut::new();
        let written = encode_frame(&config, 0x0102, 0x07, &[0xAA, 0xBB], &mut wire).unwrap();

        // SOF, ID, LEN, TYPE, ~XOR(header), payload, ~XOR(payload)
        assert_eq!(
            wire.as_ref(),
            &[0x01, 0x01, 0x02, 0x00, 0x02, 0x07, 0xF8, 0xAA, 0xBB, 0xEE]
        );
        assert_eq!(written, wire.len());
    }

    #[test]
    fn zero_length_frame_ends_after_header_checksum() {
        let config = Config {
            checksum: ChecksumKind::Crc16,
            ..Config::default()
        };
        let mut wire = BytesMut::new();
        let written = encode_frame(&config, 9, 3, &[], &mut wire).unwrap();

        assert_eq!(written, 1 + ID_BYTES + LEN_BYTES + TYPE_BYTES + 2);
        assert_eq!(written, wire_size(&config, 0));
    }

    #[test]
    fn checksum_none_omits_both_checksum_fields() {
        let config = Config {
            sof: None,
            checksum: ChecksumKind::None,
            ..Config::default()
        };
        let mut wire = BytesMut::new();
        encode_frame(&config, 0x00FF, 0x10, b"abc", &mut wire).unwrap();

        assert_eq!(wire.as_ref(), &[0x00, 0xFF, 0x00, 0x03, 0x10, b'a', b'b', b'c']);
    }

    #[test]
    fn payload_too_large_rejected_before_writing() {
        let config = Config {
            max_payload: 4,
            ..Config::default()
        };
        let mut wire = BytesMut::new();
        let err = encode_frame(&config, 1, 1, b"oversized", &mut wire).unwrap_err();

        assert!(matches!(
            err,
            FrameError::PayloadTooLarge { size: 9, max: 4 }
        ));
        assert!(wire.is_empty());
    }

    #[test]
    fn max_payload_clamped_to_len_field() {
        let config = Config {
            max_payload: usize::MAX,
            ..Config::default()
        };
        assert_eq!(config.effective_max_payload(), FrameLen::MAX as usize);
    }

    #[test]
    fn encode_appends_without_clearing() {
        let config = Config::default();
        let mut wire = BytesMut::new();
        let first = encode_frame(&config, 1, 1, b"one", &mut wire).unwrap();
        let second = encode_frame(&config, 2, 1, b"two", &mut wire).unwrap();

        assert_eq!(wire.len(), first + second);
    }

    #[test]
    fn wire_size_matches_encoded_length() {
        for kind in [
            ChecksumKind::None,
            ChecksumKind::Xor8,
            ChecksumKind::Crc16,
            ChecksumKind::Crc32,
        ] {
            for (payload, len) in [(&b""[..], 0usize), (&b"x"[..], 1), (&b"hello"[..], 5)] {
                let config = Config {
                    checksum: kind,
                    ..Config::default()
                };
                let mut wire = BytesMut::new();
                let written = encode_frame(&config, 7, 2, payload, &mut wire).unwrap();
                assert_eq!(written, wire_size(&config, len), "kind {kind:?} len {len}");
            }
        }
    }
}
