//! The typed element tree.
//!
//! Parsed elements form a strictly acyclic tree of owned values. Master
//! children preserve file order; enumerated unsigned integers keep unmapped
//! values in `Raw` variants so nothing is dropped on a round trip.

use crate::error::{EbmlError, Result};
use crate::schema;
use crate::vint::{encode_vint, read_vint};
use bitflags::bitflags;

bitflags! {
    /// SimpleBlock flag bits, lacing excluded (it is a two-bit field of its
    /// own, see [`Lacing`]). Reserved bits are retained so re-serialization
    /// is byte-exact.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BlockFlags: u8 {
        /// Frame is decodable on its own.
        const KEYFRAME = 0x80;
        /// Frame should not be displayed.
        const INVISIBLE = 0x08;
        /// Frame can be dropped under pressure.
        const DISCARDABLE = 0x01;
    }
}

/// Bit mask of the two lacing bits inside the block flag byte.
const LACING_MASK: u8 = 0b0000_0110;

/// SimpleBlock lacing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lacing {
    /// One frame per block. The only mode this library emits.
    #[default]
    None,
    /// Xiph-style size lacing.
    Xiph,
    /// Fixed-size lacing.
    Fixed,
    /// EBML delta-coded lacing.
    Ebml,
}

impl Lacing {
    /// Decode the two lacing bits.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Lacing::None,
            0b01 => Lacing::Xiph,
            0b10 => Lacing::Fixed,
            _ => Lacing::Ebml,
        }
    }

    /// The two lacing bits.
    pub fn to_bits(self) -> u8 {
        match self {
            Lacing::None => 0b00,
            Lacing::Xiph => 0b01,
            Lacing::Fixed => 0b10,
            Lacing::Ebml => 0b11,
        }
    }
}

/// A single coded frame with track, cluster-relative timecode and flags.
///
/// Laced blocks decode with `lacing` set and the lace structure left opaque
/// in `payload`; they cannot be re-serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleBlock {
    /// Track number from the leading VINT.
    pub track_number: u64,
    /// Timecode relative to the enclosing cluster, in ticks.
    pub timecode: i16,
    /// Flag bits, lacing excluded.
    pub flags: BlockFlags,
    /// Lacing mode.
    pub lacing: Lacing,
    /// Frame bytes (for laced blocks: lace header and all frames, opaque).
    pub payload: Vec<u8>,
}

impl SimpleBlock {
    /// A lacing-free block, the only form the muxer produces.
    pub fn new(track_number: u64, timecode: i16, keyframe: bool, payload: Vec<u8>) -> Self {
        let mut flags = BlockFlags::empty();
        if keyframe {
            flags |= BlockFlags::KEYFRAME;
        }
        Self {
            track_number,
            timecode,
            flags,
            lacing: Lacing::None,
            payload,
        }
    }

    /// True if the keyframe flag is set.
    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(BlockFlags::KEYFRAME)
    }

    /// Decode a SimpleBlock from a fully-buffered element payload.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let vint = read_vint(data)?
            .ok_or_else(|| EbmlError::Malformed("SimpleBlock shorter than its track VINT".into()))?;

        let pos = vint.length;
        if data.len() < pos + 3 {
            return Err(EbmlError::Malformed("SimpleBlock header too small".into()));
        }

        let timecode = i16::from_be_bytes([data[pos], data[pos + 1]]);
        let raw_flags = data[pos + 2];

        Ok(Self {
            track_number: vint.value,
            timecode,
            flags: BlockFlags::from_bits_retain(raw_flags & !LACING_MASK),
            lacing: Lacing::from_bits(raw_flags >> 1),
            payload: data[pos + 3..].to_vec(),
        })
    }

    /// Serialize the block payload (track VINT, timecode, flags, frame).
    pub fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        if self.lacing != Lacing::None {
            return Err(EbmlError::UnsupportedLacing(self.lacing));
        }

        let (track, track_len) = encode_vint(self.track_number)?;
        out.extend_from_slice(&track[..track_len]);
        out.extend_from_slice(&self.timecode.to_be_bytes());
        out.push(self.flags.bits() | (self.lacing.to_bits() << 1));
        out.extend_from_slice(&self.payload);
        Ok(())
    }
}

/// Track type, an enumerated unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackType {
    /// Video track.
    Video,
    /// Audio track.
    Audio,
    /// Combined audio/video.
    Complex,
    /// Logo overlay.
    Logo,
    /// Subtitles.
    Subtitle,
    /// Buttons.
    Buttons,
    /// Control track.
    Control,
    /// Metadata track.
    Metadata,
    /// Any other value, preserved.
    Raw(u64),
}

impl TrackType {
    /// Map from the wire integer.
    pub fn from_raw(value: u64) -> Self {
        match value {
            1 => TrackType::Video,
            2 => TrackType::Audio,
            3 => TrackType::Complex,
            16 => TrackType::Logo,
            17 => TrackType::Subtitle,
            18 => TrackType::Buttons,
            32 => TrackType::Control,
            33 => TrackType::Metadata,
            other => TrackType::Raw(other),
        }
    }

    /// The wire integer.
    pub fn to_raw(self) -> u64 {
        match self {
            TrackType::Video => 1,
            TrackType::Audio => 2,
            TrackType::Complex => 3,
            TrackType::Logo => 16,
            TrackType::Subtitle => 17,
            TrackType::Buttons => 18,
            TrackType::Control => 32,
            TrackType::Metadata => 33,
            TrackType::Raw(other) => other,
        }
    }
}

/// FlagInterlaced, an enumerated unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagInterlaced {
    /// Interlacing not determined.
    Undetermined,
    /// Interlaced content.
    Interlaced,
    /// Progressive content.
    Progressive,
    /// Any other value, preserved.
    Raw(u64),
}

impl FlagInterlaced {
    /// Map from the wire integer.
    pub fn from_raw(value: u64) -> Self {
        match value {
            0 => FlagInterlaced::Undetermined,
            1 => FlagInterlaced::Interlaced,
            2 => FlagInterlaced::Progressive,
            other => FlagInterlaced::Raw(other),
        }
    }

    /// The wire integer.
    pub fn to_raw(self) -> u64 {
        match self {
            FlagInterlaced::Undetermined => 0,
            FlagInterlaced::Interlaced => 1,
            FlagInterlaced::Progressive => 2,
            FlagInterlaced::Raw(other) => other,
        }
    }
}

/// ChromaSitingHorz/Vert, an enumerated unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaSiting {
    /// Siting unspecified.
    Unspecified,
    /// Left (horizontal) or top (vertical) collocated.
    Collocated,
    /// Half-pel offset.
    Half,
    /// Any other value, preserved.
    Raw(u64),
}

impl ChromaSiting {
    /// Map from the wire integer.
    pub fn from_raw(value: u64) -> Self {
        match value {
            0 => ChromaSiting::Unspecified,
            1 => ChromaSiting::Collocated,
            2 => ChromaSiting::Half,
            other => ChromaSiting::Raw(other),
        }
    }

    /// The wire integer.
    pub fn to_raw(self) -> u64 {
        match self {
            ChromaSiting::Unspecified => 0,
            ChromaSiting::Collocated => 1,
            ChromaSiting::Half => 2,
            ChromaSiting::Raw(other) => other,
        }
    }
}

/// CodecID, mapped from its string form. Unrecognized strings are preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecId {
    /// Opus audio.
    Opus,
    /// Vorbis audio.
    Vorbis,
    /// VP8 video.
    Vp8,
    /// VP9 video.
    Vp9,
    /// Any other codec string, preserved.
    Other(String),
}

impl From<&str> for CodecId {
    fn from(s: &str) -> Self {
        match s {
            "A_OPUS" => CodecId::Opus,
            "A_VORBIS" => CodecId::Vorbis,
            "V_VP8" => CodecId::Vp8,
            "V_VP9" => CodecId::Vp9,
            other => CodecId::Other(other.to_string()),
        }
    }
}

impl CodecId {
    /// The codec ID string.
    pub fn as_str(&self) -> &str {
        match self {
            CodecId::Opus => "A_OPUS",
            CodecId::Vorbis => "A_VORBIS",
            CodecId::Vp8 => "V_VP8",
            CodecId::Vp9 => "V_VP9",
            CodecId::Other(s) => s,
        }
    }
}

/// A child of a master element.
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    /// Raw element ID.
    pub id: u32,
    /// Typed payload.
    pub value: Value,
}

/// A typed element payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Child elements in file order.
    Master(Vec<Child>),
    /// Unsigned integer.
    UInt(u64),
    /// Signed integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// ASCII/Latin-1 string.
    Ascii(String),
    /// UTF-8 string.
    Utf8(String),
    /// Nanoseconds since 2001-01-01T00:00:00Z.
    Date(i64),
    /// Opaque bytes.
    Binary(Vec<u8>),
    /// Padding of the given payload size.
    Void(u64),
    /// Checksum bytes, carried but never interpreted.
    Crc32([u8; 4]),
    /// Structurally decoded SimpleBlock.
    SimpleBlock(SimpleBlock),
    /// Enumerated TrackType.
    TrackType(TrackType),
    /// Enumerated FlagInterlaced.
    FlagInterlaced(FlagInterlaced),
    /// Enumerated ChromaSitingHorz/Vert.
    ChromaSiting(ChromaSiting),
    /// Mapped CodecID.
    CodecId(CodecId),
    /// Payload of an element outside the schema.
    Unknown(Vec<u8>),
}

impl Value {
    /// The unsigned integer carried by this value, enumerated forms included.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            Value::TrackType(t) => Some(t.to_raw()),
            Value::FlagInterlaced(f) => Some(f.to_raw()),
            Value::ChromaSiting(c) => Some(c.to_raw()),
            _ => None,
        }
    }

    /// The float carried by this value.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The string carried by this value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Ascii(s) | Value::Utf8(s) => Some(s),
            Value::CodecId(c) => Some(c.as_str()),
            _ => None,
        }
    }

    /// The bytes carried by a binary value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(b) | Value::Unknown(b) => Some(b),
            _ => None,
        }
    }

    /// Children of a master value.
    pub fn children(&self) -> &[Child] {
        match self {
            Value::Master(children) => children,
            _ => &[],
        }
    }

    /// First direct child with the given ID.
    pub fn find(&self, id: u32) -> Option<&Value> {
        self.children()
            .iter()
            .find(|child| child.id == id)
            .map(|child| &child.value)
    }

    /// All direct children with the given ID, in file order.
    pub fn find_all(&self, id: u32) -> impl Iterator<Item = &Value> {
        self.children()
            .iter()
            .filter(move |child| child.id == id)
            .map(|child| &child.value)
    }
}

/// A completed top-level element, tagged with its raw ID.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Raw element ID.
    pub id: u32,
    /// Typed payload.
    pub value: Value,
}

impl Element {
    /// Schema name of this element.
    pub fn name(&self) -> &'static str {
        schema::element_name(self.id)
    }
}
