/// Errors from the std I/O drivers.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// An I/O error occurred while reading or writing the link.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link refused to accept more bytes (zero-length write).
    #[error("link closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, LinkError>;
