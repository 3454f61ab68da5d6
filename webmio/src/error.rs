//! WebM container error types.

use thiserror::Error;
use webmio_codec::CodecError;
use webmio_ebml::EbmlError;

/// Errors from WebM muxing and demuxing.
#[derive(Error, Debug)]
pub enum WebmError {
    /// A codec outside {Opus, VP8, VP9} was offered to the muxer.
    #[error("codec {0} is not supported for WebM output")]
    UnsupportedCodec(String),

    /// Tracks cannot be added once the header is written.
    #[error("track registration is closed after the header is written")]
    TracksFrozen,

    /// A frame arrived for a track number the muxer does not know.
    #[error("unknown track {0}")]
    UnknownTrack(u64),

    /// A frame carried neither a pts nor a dts.
    #[error("frame on track {track} has neither pts nor dts")]
    MissingTimestamp {
        /// Track number.
        track: u64,
    },

    /// Per-track timestamps must be monotonically non-decreasing.
    #[error("track {track} went backwards in time: {next} after {prev} ticks")]
    NonMonotonicTimestamp {
        /// Track number.
        track: u64,
        /// Last emitted tick.
        prev: i64,
        /// The offending tick.
        next: i64,
    },

    /// The input stream's DocType is not "webm".
    #[error("not a WebM document: DocType is {0:?}")]
    NotWebm(String),

    /// An operation was attempted in the wrong muxer state.
    #[error("{0}")]
    InvalidState(String),

    /// EBML-level failure.
    #[error(transparent)]
    Ebml(#[from] EbmlError),

    /// Codec inspection failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// I/O failure on the output writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for WebM operations.
pub type Result<T> = std::result::Result<T, WebmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WebmError::UnsupportedCodec("A_VORBIS".to_string());
        assert_eq!(err.to_string(), "codec A_VORBIS is not supported for WebM output");

        let err = WebmError::NonMonotonicTimestamp {
            track: 1,
            prev: 40,
            next: 20,
        };
        assert!(err.to_string().contains("track 1"));
    }

    #[test]
    fn test_ebml_error_wraps() {
        let err: WebmError = EbmlError::InvalidVint.into();
        assert!(matches!(err, WebmError::Ebml(_)));
    }
}
