use crate::checksum::ChecksumKind;
use crate::codec::FrameLen;
use crate::id::Peer;

/// Default start-of-frame marker byte.
pub const DEFAULT_SOF: u8 = 0x01;

/// Default maximum payload size: 1 KiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024;

/// Protocol configuration, fixed for the lifetime of a session.
///
/// Both ends of a link must agree on `sof`, `checksum` and the field widths
/// baked into the codec; nothing is negotiated on the wire.
#[derive(Debug, Clone)]
pub struct Config {
    /// Start-of-frame marker. With `None`, frames start at the first byte
    /// after the previous frame and the parser cannot hunt for a
    /// resynchronization point in a corrupted stream.
    pub sof: Option<u8>,
    /// Checksum algorithm for the header and payload checksums.
    pub checksum: ChecksumKind,
    /// Maximum payload size accepted and composed, in bytes. Values beyond
    /// what the LEN field can express are clamped.
    pub max_payload: usize,
    /// Idle ticks after which a partial frame is abandoned. `0` disables
    /// the timeout.
    pub timeout_ticks: u32,
    /// Which half of the ID space this endpoint allocates from.
    pub peer: Peer,
    /// Capacity of the ID listener table.
    pub id_listeners: usize,
    /// Capacity of the type listener table.
    pub type_listeners: usize,
    /// Capacity of the generic listener table.
    pub generic_listeners: usize,
}

impl Config {
    /// Maximum payload size actually enforced: `max_payload` clamped to
    /// what the LEN field can carry.
    pub fn effective_max_payload(&self) -> usize {
        self.max_payload.min(FrameLen::MAX as usize)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sof: Some(DEFAULT_SOF),
            checksum: ChecksumKind::Crc16,
            max_payload: DEFAULT_MAX_PAYLOAD,
            timeout_ticks: 10,
            peer: Peer::A,
            id_listeners: 16,
            type_listeners: 16,
            generic_listeners: 4,
        }
    }
}
