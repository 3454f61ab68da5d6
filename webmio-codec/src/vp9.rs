//! VP9 uncompressed-header inspection.
//!
//! Walks just enough of the uncompressed header to find the `frame_type`
//! bit: frame marker, the split profile bits (plus the reserved bit profile
//! 3 carries), and `show_existing_frame`, which short-circuits the header
//! before any frame type is coded.

use crate::bitstream::BitReader;
use crate::error::{CodecError, Result};

/// Parse the header prefix and report whether the frame is a keyframe.
///
/// A `show_existing_frame` header carries no frame type and is never a
/// keyframe.
pub fn frame_kind(payload: &[u8]) -> Result<bool> {
    let mut reader = BitReader::new(payload);

    let frame_marker = reader.read_bits(2)? as u8;
    if frame_marker != 2 {
        return Err(CodecError::InvalidFrameMarker(frame_marker));
    }

    let profile_low = reader.read_bit()? as u8;
    let profile_high = reader.read_bit()? as u8;
    let profile = (profile_high << 1) | profile_low;
    if profile == 3 {
        // Reserved zero bit
        reader.read_bit()?;
    }

    let show_existing_frame = reader.read_bit()?;
    if show_existing_frame {
        return Ok(false);
    }

    // frame_type: 0 = keyframe
    let frame_type = reader.read_bit()?;
    Ok(!frame_type)
}

/// True if `payload` starts a VP9 keyframe. Malformed input is non-key.
pub fn is_keyframe(payload: &[u8]) -> bool {
    frame_kind(payload).unwrap_or(false)
}
