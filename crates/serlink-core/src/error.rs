/// Errors surfaced by frame composition and send operations.
///
/// Parse-path failures (checksum mismatch, oversized length, stalled partial
/// frames) are never errors: the parser silently drops the frame and
/// resynchronizes on the next start marker.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// No free slot in the ID listener table for a reply correlation.
    #[error("ID listener table full (capacity {capacity})")]
    ListenerTableFull { capacity: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
