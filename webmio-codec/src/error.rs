//! Codec inspection error types.

use thiserror::Error;

/// Errors from codec bitstream inspection and header construction.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The payload ended before the header fields did.
    #[error("unexpected end of bitstream")]
    UnexpectedEnd,

    /// The VP9 frame marker was not the required value 2.
    #[error("invalid VP9 frame marker: {0}")]
    InvalidFrameMarker(u8),

    /// WebM Opus is limited to mono and stereo here.
    #[error("unsupported Opus channel count: {0}")]
    UnsupportedChannelCount(u8),
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
