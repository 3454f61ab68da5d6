//! The WebM element schema.
//!
//! A closed, compile-time table mapping raw element IDs to names and typed
//! kinds. All typing in the parser flows from this table; IDs that are not
//! listed decode as [`ElementKind::Unknown`] and are skipped by declared
//! length rather than treated as fatal.

/// Raw element IDs (VINT form, width marker included).
pub mod ids {
    // EBML header
    /// EBML header.
    pub const EBML: u32 = 0x1A45_DFA3;
    /// EBMLVersion.
    pub const EBML_VERSION: u32 = 0x4286;
    /// EBMLReadVersion.
    pub const EBML_READ_VERSION: u32 = 0x42F7;
    /// EBMLMaxIDLength.
    pub const EBML_MAX_ID_LENGTH: u32 = 0x42F2;
    /// EBMLMaxSizeLength.
    pub const EBML_MAX_SIZE_LENGTH: u32 = 0x42F3;
    /// DocType.
    pub const DOC_TYPE: u32 = 0x4282;
    /// DocTypeVersion.
    pub const DOC_TYPE_VERSION: u32 = 0x4287;
    /// DocTypeReadVersion.
    pub const DOC_TYPE_READ_VERSION: u32 = 0x4285;

    // Segment
    /// Segment, the single container for everything after the EBML header.
    pub const SEGMENT: u32 = 0x1853_8067;

    // SeekHead
    /// SeekHead.
    pub const SEEK_HEAD: u32 = 0x114D_9B74;
    /// Seek entry.
    pub const SEEK: u32 = 0x4DBB;
    /// SeekID.
    pub const SEEK_ID: u32 = 0x53AB;
    /// SeekPosition.
    pub const SEEK_POSITION: u32 = 0x53AC;

    // Info
    /// Segment Info.
    pub const INFO: u32 = 0x1549_A966;
    /// SegmentUID.
    pub const SEGMENT_UID: u32 = 0x73A4;
    /// TimecodeScale (nanoseconds per tick).
    pub const TIMECODE_SCALE: u32 = 0x2A_D7B1;
    /// Duration in ticks.
    pub const DURATION: u32 = 0x4489;
    /// DateUTC (nanoseconds since 2001-01-01T00:00:00Z).
    pub const DATE_UTC: u32 = 0x4461;
    /// Title.
    pub const TITLE: u32 = 0x7BA9;
    /// MuxingApp.
    pub const MUXING_APP: u32 = 0x4D80;
    /// WritingApp.
    pub const WRITING_APP: u32 = 0x5741;

    // Cluster
    /// Cluster.
    pub const CLUSTER: u32 = 0x1F43_B675;
    /// Cluster Timecode.
    pub const TIMECODE: u32 = 0xE7;
    /// Cluster Position.
    pub const POSITION: u32 = 0xA7;
    /// PrevSize.
    pub const PREV_SIZE: u32 = 0xAB;
    /// SimpleBlock.
    pub const SIMPLE_BLOCK: u32 = 0xA3;
    /// BlockGroup.
    pub const BLOCK_GROUP: u32 = 0xA0;
    /// Block.
    pub const BLOCK: u32 = 0xA1;
    /// BlockDuration.
    pub const BLOCK_DURATION: u32 = 0x9B;
    /// ReferenceBlock.
    pub const REFERENCE_BLOCK: u32 = 0xFB;
    /// DiscardPadding.
    pub const DISCARD_PADDING: u32 = 0x75A2;

    // Tracks
    /// Tracks.
    pub const TRACKS: u32 = 0x1654_AE6B;
    /// TrackEntry.
    pub const TRACK_ENTRY: u32 = 0xAE;
    /// TrackNumber.
    pub const TRACK_NUMBER: u32 = 0xD7;
    /// TrackUID.
    pub const TRACK_UID: u32 = 0x73C5;
    /// TrackType.
    pub const TRACK_TYPE: u32 = 0x83;
    /// FlagEnabled.
    pub const FLAG_ENABLED: u32 = 0xB9;
    /// FlagDefault.
    pub const FLAG_DEFAULT: u32 = 0x88;
    /// FlagForced.
    pub const FLAG_FORCED: u32 = 0x55AA;
    /// FlagLacing.
    pub const FLAG_LACING: u32 = 0x9C;
    /// DefaultDuration.
    pub const DEFAULT_DURATION: u32 = 0x23_E383;
    /// Track Name.
    pub const NAME: u32 = 0x536E;
    /// Language (ISO 639-2).
    pub const LANGUAGE: u32 = 0x22_B59C;
    /// CodecID.
    pub const CODEC_ID: u32 = 0x86;
    /// CodecPrivate.
    pub const CODEC_PRIVATE: u32 = 0x63A2;
    /// CodecName.
    pub const CODEC_NAME: u32 = 0x25_8688;
    /// CodecDelay.
    pub const CODEC_DELAY: u32 = 0x56AA;
    /// SeekPreRoll.
    pub const SEEK_PRE_ROLL: u32 = 0x56BB;

    // Video settings
    /// Video.
    pub const VIDEO: u32 = 0xE0;
    /// FlagInterlaced.
    pub const FLAG_INTERLACED: u32 = 0x9A;
    /// StereoMode.
    pub const STEREO_MODE: u32 = 0x53B8;
    /// AlphaMode.
    pub const ALPHA_MODE: u32 = 0x53C0;
    /// PixelWidth.
    pub const PIXEL_WIDTH: u32 = 0xB0;
    /// PixelHeight.
    pub const PIXEL_HEIGHT: u32 = 0xBA;
    /// PixelCropBottom.
    pub const PIXEL_CROP_BOTTOM: u32 = 0x54AA;
    /// PixelCropTop.
    pub const PIXEL_CROP_TOP: u32 = 0x54BB;
    /// PixelCropLeft.
    pub const PIXEL_CROP_LEFT: u32 = 0x54CC;
    /// PixelCropRight.
    pub const PIXEL_CROP_RIGHT: u32 = 0x54DD;
    /// DisplayWidth.
    pub const DISPLAY_WIDTH: u32 = 0x54B0;
    /// DisplayHeight.
    pub const DISPLAY_HEIGHT: u32 = 0x54BA;
    /// DisplayUnit.
    pub const DISPLAY_UNIT: u32 = 0x54B2;
    /// Colour.
    pub const COLOUR: u32 = 0x55B0;
    /// MatrixCoefficients.
    pub const MATRIX_COEFFICIENTS: u32 = 0x55B1;
    /// BitsPerChannel.
    pub const BITS_PER_CHANNEL: u32 = 0x55B2;
    /// ChromaSubsamplingHorz.
    pub const CHROMA_SUBSAMPLING_HORZ: u32 = 0x55B3;
    /// ChromaSubsamplingVert.
    pub const CHROMA_SUBSAMPLING_VERT: u32 = 0x55B4;
    /// ChromaSitingHorz.
    pub const CHROMA_SITING_HORZ: u32 = 0x55B7;
    /// ChromaSitingVert.
    pub const CHROMA_SITING_VERT: u32 = 0x55B8;
    /// Range.
    pub const RANGE: u32 = 0x55B9;
    /// TransferCharacteristics.
    pub const TRANSFER_CHARACTERISTICS: u32 = 0x55BA;
    /// Primaries.
    pub const PRIMARIES: u32 = 0x55BB;

    // Audio settings
    /// Audio.
    pub const AUDIO: u32 = 0xE1;
    /// SamplingFrequency.
    pub const SAMPLING_FREQUENCY: u32 = 0xB5;
    /// OutputSamplingFrequency.
    pub const OUTPUT_SAMPLING_FREQUENCY: u32 = 0x78B5;
    /// Channels.
    pub const CHANNELS: u32 = 0x9F;
    /// BitDepth.
    pub const BIT_DEPTH: u32 = 0x6264;

    // Cues
    /// Cues.
    pub const CUES: u32 = 0x1C53_BB6B;
    /// CuePoint.
    pub const CUE_POINT: u32 = 0xBB;
    /// CueTime.
    pub const CUE_TIME: u32 = 0xB3;
    /// CueTrackPositions.
    pub const CUE_TRACK_POSITIONS: u32 = 0xB7;
    /// CueTrack.
    pub const CUE_TRACK: u32 = 0xF7;
    /// CueClusterPosition.
    pub const CUE_CLUSTER_POSITION: u32 = 0xF1;
    /// CueRelativePosition.
    pub const CUE_RELATIVE_POSITION: u32 = 0xF0;
    /// CueDuration.
    pub const CUE_DURATION: u32 = 0xB2;
    /// CueBlockNumber.
    pub const CUE_BLOCK_NUMBER: u32 = 0x5378;

    // Tags
    /// Tags.
    pub const TAGS: u32 = 0x1254_C367;
    /// Tag.
    pub const TAG: u32 = 0x7373;
    /// Targets.
    pub const TARGETS: u32 = 0x63C0;
    /// TargetTypeValue.
    pub const TARGET_TYPE_VALUE: u32 = 0x68CA;
    /// TargetType.
    pub const TARGET_TYPE: u32 = 0x63CA;
    /// TagTrackUID.
    pub const TAG_TRACK_UID: u32 = 0x63C5;
    /// SimpleTag.
    pub const SIMPLE_TAG: u32 = 0x67C8;
    /// TagName.
    pub const TAG_NAME: u32 = 0x45A3;
    /// TagLanguage.
    pub const TAG_LANGUAGE: u32 = 0x447A;
    /// TagDefault.
    pub const TAG_DEFAULT: u32 = 0x4484;
    /// TagString.
    pub const TAG_STRING: u32 = 0x4487;
    /// TagBinary.
    pub const TAG_BINARY: u32 = 0x4485;

    // Padding and checksums
    /// Void.
    pub const VOID: u32 = 0xEC;
    /// CRC-32.
    pub const CRC32: u32 = 0xBF;
}

/// Typed kind of an element, driving payload interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Container of child elements.
    Master,
    /// Big-endian unsigned integer, 0..8 bytes.
    UInt,
    /// Big-endian signed integer, 0..8 bytes.
    Int,
    /// IEEE float, 0, 4 or 8 bytes.
    Float,
    /// ASCII/Latin-1 string, NUL-truncated.
    String,
    /// UTF-8 string, NUL-truncated.
    Utf8,
    /// Signed nanosecond offset from 2001-01-01T00:00:00Z.
    Date,
    /// Opaque bytes.
    Binary,
    /// Padding; only the size is meaningful.
    Void,
    /// CRC-32 checksum over the enclosing master.
    Crc32,
    /// Not in the schema.
    Unknown,
}

use ids::*;

/// The schema table: raw ID, name, kind.
///
/// Single source of truth; both lookup directions read from it.
static SCHEMA: &[(u32, &str, ElementKind)] = &[
    (EBML, "EBML", ElementKind::Master),
    (EBML_VERSION, "EBMLVersion", ElementKind::UInt),
    (EBML_READ_VERSION, "EBMLReadVersion", ElementKind::UInt),
    (EBML_MAX_ID_LENGTH, "EBMLMaxIDLength", ElementKind::UInt),
    (EBML_MAX_SIZE_LENGTH, "EBMLMaxSizeLength", ElementKind::UInt),
    (DOC_TYPE, "DocType", ElementKind::String),
    (DOC_TYPE_VERSION, "DocTypeVersion", ElementKind::UInt),
    (DOC_TYPE_READ_VERSION, "DocTypeReadVersion", ElementKind::UInt),
    (SEGMENT, "Segment", ElementKind::Master),
    (SEEK_HEAD, "SeekHead", ElementKind::Master),
    (SEEK, "Seek", ElementKind::Master),
    (SEEK_ID, "SeekID", ElementKind::Binary),
    (SEEK_POSITION, "SeekPosition", ElementKind::UInt),
    (INFO, "Info", ElementKind::Master),
    (SEGMENT_UID, "SegmentUID", ElementKind::Binary),
    (TIMECODE_SCALE, "TimecodeScale", ElementKind::UInt),
    (DURATION, "Duration", ElementKind::Float),
    (DATE_UTC, "DateUTC", ElementKind::Date),
    (TITLE, "Title", ElementKind::Utf8),
    (MUXING_APP, "MuxingApp", ElementKind::Utf8),
    (WRITING_APP, "WritingApp", ElementKind::Utf8),
    (CLUSTER, "Cluster", ElementKind::Master),
    (TIMECODE, "Timecode", ElementKind::UInt),
    (POSITION, "Position", ElementKind::UInt),
    (PREV_SIZE, "PrevSize", ElementKind::UInt),
    (SIMPLE_BLOCK, "SimpleBlock", ElementKind::Binary),
    (BLOCK_GROUP, "BlockGroup", ElementKind::Master),
    (BLOCK, "Block", ElementKind::Binary),
    (BLOCK_DURATION, "BlockDuration", ElementKind::UInt),
    (REFERENCE_BLOCK, "ReferenceBlock", ElementKind::Int),
    (DISCARD_PADDING, "DiscardPadding", ElementKind::Int),
    (TRACKS, "Tracks", ElementKind::Master),
    (TRACK_ENTRY, "TrackEntry", ElementKind::Master),
    (TRACK_NUMBER, "TrackNumber", ElementKind::UInt),
    (TRACK_UID, "TrackUID", ElementKind::UInt),
    (TRACK_TYPE, "TrackType", ElementKind::UInt),
    (FLAG_ENABLED, "FlagEnabled", ElementKind::UInt),
    (FLAG_DEFAULT, "FlagDefault", ElementKind::UInt),
    (FLAG_FORCED, "FlagForced", ElementKind::UInt),
    (FLAG_LACING, "FlagLacing", ElementKind::UInt),
    (DEFAULT_DURATION, "DefaultDuration", ElementKind::UInt),
    (NAME, "Name", ElementKind::Utf8),
    (LANGUAGE, "Language", ElementKind::String),
    (CODEC_ID, "CodecID", ElementKind::String),
    (CODEC_PRIVATE, "CodecPrivate", ElementKind::Binary),
    (CODEC_NAME, "CodecName", ElementKind::Utf8),
    (CODEC_DELAY, "CodecDelay", ElementKind::UInt),
    (SEEK_PRE_ROLL, "SeekPreRoll", ElementKind::UInt),
    (VIDEO, "Video", ElementKind::Master),
    (FLAG_INTERLACED, "FlagInterlaced", ElementKind::UInt),
    (STEREO_MODE, "StereoMode", ElementKind::UInt),
    (ALPHA_MODE, "AlphaMode", ElementKind::UInt),
    (PIXEL_WIDTH, "PixelWidth", ElementKind::UInt),
    (PIXEL_HEIGHT, "PixelHeight", ElementKind::UInt),
    (PIXEL_CROP_BOTTOM, "PixelCropBottom", ElementKind::UInt),
    (PIXEL_CROP_TOP, "PixelCropTop", ElementKind::UInt),
    (PIXEL_CROP_LEFT, "PixelCropLeft", ElementKind::UInt),
    (PIXEL_CROP_RIGHT, "PixelCropRight", ElementKind::UInt),
    (DISPLAY_WIDTH, "DisplayWidth", ElementKind::UInt),
    (DISPLAY_HEIGHT, "DisplayHeight", ElementKind::UInt),
    (DISPLAY_UNIT, "DisplayUnit", ElementKind::UInt),
    (COLOUR, "Colour", ElementKind::Master),
    (MATRIX_COEFFICIENTS, "MatrixCoefficients", ElementKind::UInt),
    (BITS_PER_CHANNEL, "BitsPerChannel", ElementKind::UInt),
    (CHROMA_SUBSAMPLING_HORZ, "ChromaSubsamplingHorz", ElementKind::UInt),
    (CHROMA_SUBSAMPLING_VERT, "ChromaSubsamplingVert", ElementKind::UInt),
    (CHROMA_SITING_HORZ, "ChromaSitingHorz", ElementKind::UInt),
    (CHROMA_SITING_VERT, "ChromaSitingVert", ElementKind::UInt),
    (RANGE, "Range", ElementKind::UInt),
    (TRANSFER_CHARACTERISTICS, "TransferCharacteristics", ElementKind::UInt),
    (PRIMARIES, "Primaries", ElementKind::UInt),
    (AUDIO, "Audio", ElementKind::Master),
    (SAMPLING_FREQUENCY, "SamplingFrequency", ElementKind::Float),
    (OUTPUT_SAMPLING_FREQUENCY, "OutputSamplingFrequency", ElementKind::Float),
    (CHANNELS, "Channels", ElementKind::UInt),
    (BIT_DEPTH, "BitDepth", ElementKind::UInt),
    (CUES, "Cues", ElementKind::Master),
    (CUE_POINT, "CuePoint", ElementKind::Master),
    (CUE_TIME, "CueTime", ElementKind::UInt),
    (CUE_TRACK_POSITIONS, "CueTrackPositions", ElementKind::Master),
    (CUE_TRACK, "CueTrack", ElementKind::UInt),
    (CUE_CLUSTER_POSITION, "CueClusterPosition", ElementKind::UInt),
    (CUE_RELATIVE_POSITION, "CueRelativePosition", ElementKind::UInt),
    (CUE_DURATION, "CueDuration", ElementKind::UInt),
    (CUE_BLOCK_NUMBER, "CueBlockNumber", ElementKind::UInt),
    (TAGS, "Tags", ElementKind::Master),
    (TAG, "Tag", ElementKind::Master),
    (TARGETS, "Targets", ElementKind::Master),
    (TARGET_TYPE_VALUE, "TargetTypeValue", ElementKind::UInt),
    (TARGET_TYPE, "TargetType", ElementKind::String),
    (TAG_TRACK_UID, "TagTrackUID", ElementKind::UInt),
    (SIMPLE_TAG, "SimpleTag", ElementKind::Master),
    (TAG_NAME, "TagName", ElementKind::Utf8),
    (TAG_LANGUAGE, "TagLanguage", ElementKind::String),
    (TAG_DEFAULT, "TagDefault", ElementKind::UInt),
    (TAG_STRING, "TagString", ElementKind::Utf8),
    (TAG_BINARY, "TagBinary", ElementKind::Binary),
    (VOID, "Void", ElementKind::Void),
    (CRC32, "CRC-32", ElementKind::Crc32),
];

/// Look up name and kind for a raw element ID.
pub fn lookup(id: u32) -> (&'static str, ElementKind) {
    SCHEMA
        .iter()
        .find(|entry| entry.0 == id)
        .map(|entry| (entry.1, entry.2))
        .unwrap_or(("Unknown", ElementKind::Unknown))
}

/// The typed kind of an element.
pub fn element_kind(id: u32) -> ElementKind {
    lookup(id).1
}

/// The schema name of an element, `"Unknown"` for unlisted IDs.
pub fn element_name(id: u32) -> &'static str {
    lookup(id).0
}

/// Reverse lookup from schema name to raw ID.
pub fn id_by_name(name: &str) -> Option<u32> {
    SCHEMA
        .iter()
        .find(|entry| entry.1 == name)
        .map(|entry| entry.0)
}

/// True for the elements that stream out of a Segment one at a time: the
/// EBML header itself plus the direct Segment children the demuxer emits.
pub fn is_segment_top_level(id: u32) -> bool {
    matches!(
        id,
        EBML | SEEK_HEAD | INFO | TRACKS | TAGS | CUES | CLUSTER
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ids() {
        assert_eq!(ids::EBML, 0x1A45_DFA3);
        assert_eq!(ids::SEGMENT, 0x1853_8067);
        assert_eq!(ids::CLUSTER, 0x1F43_B675);
        assert_eq!(ids::TRACKS, 0x1654_AE6B);
        assert_eq!(ids::CUES, 0x1C53_BB6B);
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(ids::EBML), ("EBML", ElementKind::Master));
        assert_eq!(lookup(ids::TRACK_NUMBER), ("TrackNumber", ElementKind::UInt));
        assert_eq!(lookup(ids::DURATION), ("Duration", ElementKind::Float));
        assert_eq!(lookup(ids::CODEC_ID), ("CodecID", ElementKind::String));
        assert_eq!(lookup(ids::TITLE), ("Title", ElementKind::Utf8));
        assert_eq!(lookup(ids::DATE_UTC), ("DateUTC", ElementKind::Date));
        assert_eq!(lookup(ids::VOID), ("Void", ElementKind::Void));
        assert_eq!(lookup(0xDEAD_BEEF), ("Unknown", ElementKind::Unknown));
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(id_by_name("Timecode"), Some(ids::TIMECODE));
        assert_eq!(id_by_name("SimpleBlock"), Some(ids::SIMPLE_BLOCK));
        assert_eq!(id_by_name("NoSuchElement"), None);
    }

    #[test]
    fn test_top_level_set() {
        for id in [
            ids::EBML,
            ids::SEEK_HEAD,
            ids::INFO,
            ids::TRACKS,
            ids::TAGS,
            ids::CUES,
            ids::CLUSTER,
        ] {
            assert!(is_segment_top_level(id));
        }
        assert!(!is_segment_top_level(ids::SEGMENT));
        assert!(!is_segment_top_level(ids::TRACK_ENTRY));
        assert!(!is_segment_top_level(ids::VOID));
    }

    #[test]
    fn test_no_duplicate_entries() {
        for (i, a) in SCHEMA.iter().enumerate() {
            for b in &SCHEMA[i + 1..] {
                assert_ne!(a.0, b.0, "duplicate id {:#010X}", a.0);
                assert_ne!(a.1, b.1, "duplicate name {}", a.1);
            }
        }
    }
}
