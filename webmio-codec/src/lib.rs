//! # webmio-codec
//!
//! Codec bitstream inspection for WebM muxing.
//!
//! The clustering policy only needs two facts from the coded payloads it
//! handles: whether a video frame is a keyframe (clusters must start on
//! one), and the Opus ID header a track's CodecPrivate carries. This crate
//! provides exactly that — VP8 frame tag parsing, the VP9
//! uncompressed-header prefix walk, and `OpusHead` construction — without
//! pulling in any decoding machinery.

#![warn(missing_docs)]

pub mod bitstream;
pub mod error;
pub mod opus;
pub mod vp8;
pub mod vp9;

pub use bitstream::BitReader;
pub use error::{CodecError, Result};

/// Video codecs the inspector understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// VP8.
    Vp8,
    /// VP9.
    Vp9,
}

/// True if `payload` is a keyframe under the given codec's rules.
///
/// Malformed headers are reported as non-key so a corrupt frame cannot force
/// a cluster boundary.
pub fn is_video_keyframe(codec: VideoCodec, payload: &[u8]) -> bool {
    match codec {
        VideoCodec::Vp8 => vp8::is_keyframe(payload),
        VideoCodec::Vp9 => vp9::is_keyframe(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch() {
        // VP8 keyframe: bit 0 of byte 0 clear
        assert!(is_video_keyframe(VideoCodec::Vp8, &[0x10, 0x00, 0x00]));
        assert!(!is_video_keyframe(VideoCodec::Vp8, &[0x11, 0x00, 0x00]));

        // VP9 keyframe: marker, profile 0, shown, frame_type 0
        assert!(is_video_keyframe(VideoCodec::Vp9, &[0b1000_0000]));
        assert!(!is_video_keyframe(VideoCodec::Vp9, &[0b1000_0100]));
    }

    #[test]
    fn test_empty_payload_is_not_key() {
        assert!(!is_video_keyframe(VideoCodec::Vp8, &[]));
        assert!(!is_video_keyframe(VideoCodec::Vp9, &[]));
    }
}
