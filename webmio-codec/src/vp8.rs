//! VP8 frame tag inspection (RFC 6386 §9.1).
//!
//! The first three bytes of every VP8 frame form a little-endian tag whose
//! lowest bit distinguishes keyframes from interframes. That is all the
//! clustering policy needs; no further decoding happens here.

use crate::error::{CodecError, Result};

/// The decoded three-byte frame tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTag {
    /// True for keyframes (`frame_type == 0`).
    pub keyframe: bool,
    /// Bitstream version (0..=3 profile-relevant).
    pub version: u8,
    /// Whether the frame is meant to be shown.
    pub show_frame: bool,
    /// Size of the first data partition in bytes.
    pub first_part_size: u32,
}

impl FrameTag {
    /// Parse the frame tag from the front of a VP8 frame.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < 3 {
            return Err(CodecError::UnexpectedEnd);
        }

        let tag = payload[0] as u32 | (payload[1] as u32) << 8 | (payload[2] as u32) << 16;

        Ok(Self {
            keyframe: tag & 1 == 0,
            version: ((tag >> 1) & 0x07) as u8,
            show_frame: (tag >> 4) & 1 != 0,
            first_part_size: (tag >> 5) & 0x7_FFFF,
        })
    }
}

/// True if `payload` starts a VP8 keyframe. Malformed input is non-key.
pub fn is_keyframe(payload: &[u8]) -> bool {
    FrameTag::parse(payload).map(|tag| tag.keyframe).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyframe_bit() {
        // frame_type is bit 0 of byte 0: clear = keyframe
        assert!(is_keyframe(&[0x10, 0x00, 0x00, 0x9D, 0x01, 0x2A]));
        assert!(!is_keyframe(&[0x11, 0x00, 0x00]));
    }

    #[test]
    fn test_tag_fields() {
        // version 2, show_frame set, first partition 0x54
        let byte0 = 0b0000_0100u8 | 0b0001_0000;
        let tag = FrameTag::parse(&[byte0 | (0x54 << 5) as u8, 0x54 >> 3, 0x00]).unwrap();

        assert!(tag.keyframe);
        assert_eq!(tag.version, 2);
        assert!(tag.show_frame);
        assert_eq!(tag.first_part_size, 0x54);
    }

    #[test]
    fn test_short_payload() {
        assert!(matches!(
            FrameTag::parse(&[0x10, 0x00]),
            Err(CodecError::UnexpectedEnd)
        ));
        assert!(!is_keyframe(&[0x10]));
    }
}
