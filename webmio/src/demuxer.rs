//! Push-based WebM demuxing.
//!
//! A thin facade over the incremental EBML parser: bytes go in as they
//! arrive, completed top-level elements come out in file order. Along the
//! way the demuxer validates the DocType and keeps interpreted views of the
//! Info and Tracks elements for convenient access.

use crate::error::{Result, WebmError};
use std::collections::BTreeMap;
use webmio_ebml::{ids, CodecId, Element, FlagInterlaced, StreamingParser, TrackType, Value};

/// Interpreted Segment Info.
#[derive(Debug, Clone)]
pub struct SegmentInfo {
    /// Nanoseconds per tick.
    pub timecode_scale: u64,
    /// Muxing application.
    pub muxing_app: Option<String>,
    /// Writing application.
    pub writing_app: Option<String>,
    /// Title.
    pub title: Option<String>,
    /// Duration in ticks.
    pub duration: Option<f64>,
    /// DateUTC in nanoseconds since 2001-01-01T00:00:00Z.
    pub date_utc: Option<i64>,
}

impl Default for SegmentInfo {
    fn default() -> Self {
        Self {
            timecode_scale: 1_000_000,
            muxing_app: None,
            writing_app: None,
            title: None,
            duration: None,
            date_utc: None,
        }
    }
}

impl SegmentInfo {
    fn from_value(value: &Value) -> Self {
        Self {
            timecode_scale: value
                .find(ids::TIMECODE_SCALE)
                .and_then(Value::as_uint)
                .unwrap_or(1_000_000),
            muxing_app: value
                .find(ids::MUXING_APP)
                .and_then(Value::as_str)
                .map(str::to_string),
            writing_app: value
                .find(ids::WRITING_APP)
                .and_then(Value::as_str)
                .map(str::to_string),
            title: value
                .find(ids::TITLE)
                .and_then(Value::as_str)
                .map(str::to_string),
            duration: value.find(ids::DURATION).and_then(Value::as_float),
            date_utc: value.find(ids::DATE_UTC).and_then(|v| match v {
                Value::Date(ns) => Some(*ns),
                _ => None,
            }),
        }
    }
}

/// Video parameters of a track.
#[derive(Debug, Clone)]
pub struct VideoInfo {
    /// Pixel width.
    pub width: u64,
    /// Pixel height.
    pub height: u64,
    /// Display width.
    pub display_width: Option<u64>,
    /// Display height.
    pub display_height: Option<u64>,
    /// Interlacing mode, if declared.
    pub interlaced: Option<FlagInterlaced>,
}

/// Audio parameters of a track.
#[derive(Debug, Clone)]
pub struct AudioInfo {
    /// Sampling frequency in Hz.
    pub sample_rate: f64,
    /// Channel count.
    pub channels: u64,
    /// Bits per sample.
    pub bit_depth: Option<u64>,
}

/// Interpreted TrackEntry.
#[derive(Debug, Clone)]
pub struct TrackInfo {
    /// Track number.
    pub number: u64,
    /// Track UID.
    pub uid: u64,
    /// Track type.
    pub track_type: TrackType,
    /// Codec.
    pub codec: CodecId,
    /// CodecPrivate bytes.
    pub codec_private: Option<Vec<u8>>,
    /// Track name.
    pub name: Option<String>,
    /// Language code.
    pub language: Option<String>,
    /// DefaultDuration in nanoseconds.
    pub default_duration: Option<u64>,
    /// Video parameters, for video tracks.
    pub video: Option<VideoInfo>,
    /// Audio parameters, for audio tracks.
    pub audio: Option<AudioInfo>,
}

impl TrackInfo {
    fn from_value(entry: &Value) -> Option<Self> {
        let number = entry.find(ids::TRACK_NUMBER).and_then(Value::as_uint)?;

        let video = entry.find(ids::VIDEO).map(|v| VideoInfo {
            width: v.find(ids::PIXEL_WIDTH).and_then(Value::as_uint).unwrap_or(0),
            height: v
                .find(ids::PIXEL_HEIGHT)
                .and_then(Value::as_uint)
                .unwrap_or(0),
            display_width: v.find(ids::DISPLAY_WIDTH).and_then(Value::as_uint),
            display_height: v.find(ids::DISPLAY_HEIGHT).and_then(Value::as_uint),
            interlaced: v.find(ids::FLAG_INTERLACED).and_then(|value| match value {
                Value::FlagInterlaced(f) => Some(*f),
                _ => None,
            }),
        });

        let audio = entry.find(ids::AUDIO).map(|a| AudioInfo {
            sample_rate: a
                .find(ids::SAMPLING_FREQUENCY)
                .and_then(Value::as_float)
                .unwrap_or(8_000.0),
            channels: a.find(ids::CHANNELS).and_then(Value::as_uint).unwrap_or(1),
            bit_depth: a.find(ids::BIT_DEPTH).and_then(Value::as_uint),
        });

        Some(Self {
            number,
            uid: entry.find(ids::TRACK_UID).and_then(Value::as_uint).unwrap_or(0),
            track_type: entry
                .find(ids::TRACK_TYPE)
                .and_then(|value| match value {
                    Value::TrackType(t) => Some(*t),
                    _ => None,
                })
                .unwrap_or(TrackType::Raw(0)),
            codec: entry
                .find(ids::CODEC_ID)
                .and_then(|value| match value {
                    Value::CodecId(c) => Some(c.clone()),
                    _ => None,
                })
                .unwrap_or(CodecId::Other(String::new())),
            codec_private: entry
                .find(ids::CODEC_PRIVATE)
                .and_then(Value::as_bytes)
                .map(<[u8]>::to_vec),
            name: entry
                .find(ids::NAME)
                .and_then(Value::as_str)
                .map(str::to_string),
            language: entry
                .find(ids::LANGUAGE)
                .and_then(Value::as_str)
                .map(str::to_string),
            default_duration: entry.find(ids::DEFAULT_DURATION).and_then(Value::as_uint),
            video,
            audio,
        })
    }
}

/// Push-based WebM demuxer.
#[derive(Debug, Default)]
pub struct WebmDemuxer {
    parser: StreamingParser,
    /// Interpreted Segment Info, updated when Info streams past.
    pub info: SegmentInfo,
    /// Interpreted tracks by track number, updated when Tracks streams past.
    pub tracks: BTreeMap<u64, TrackInfo>,
}

impl WebmDemuxer {
    /// A demuxer with an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an input chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.parser.push(chunk);
    }

    /// Produce the next top-level element, if a complete one is buffered.
    ///
    /// Elements are emitted in file order, one per call. The EBML header is
    /// validated to carry DocType "webm"; Info and Tracks additionally
    /// update [`Self::info`] and [`Self::tracks`] as they pass through.
    pub fn poll(&mut self) -> Result<Option<Element>> {
        let Some(element) = self.parser.poll()? else {
            return Ok(None);
        };

        match element.id {
            ids::EBML => {
                let doc_type = element
                    .value
                    .find(ids::DOC_TYPE)
                    .and_then(Value::as_str)
                    .unwrap_or("");
                if doc_type != "webm" {
                    return Err(WebmError::NotWebm(doc_type.to_string()));
                }
            }
            ids::INFO => {
                self.info = SegmentInfo::from_value(&element.value);
            }
            ids::TRACKS => {
                for entry in element.value.find_all(ids::TRACK_ENTRY) {
                    if let Some(track) = TrackInfo::from_value(entry) {
                        self.tracks.insert(track.number, track);
                    }
                }
            }
            _ => {}
        }

        Ok(Some(element))
    }

    /// Number of tracks seen so far.
    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Track info by track number.
    pub fn track(&self, number: u64) -> Option<&TrackInfo> {
        self.tracks.get(&number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webmio_ebml::write::{encode_element, write_element_id};
    use webmio_ebml::{encode_vint, Child};

    fn child(id: u32, value: Value) -> Child {
        Child { id, value }
    }

    fn ebml_header(doc_type: &str) -> Vec<u8> {
        let value = Value::Master(vec![
            child(ids::EBML_VERSION, Value::UInt(1)),
            child(ids::DOC_TYPE, Value::Ascii(doc_type.to_string())),
        ]);
        let mut out = Vec::new();
        encode_element(ids::EBML, &value, &mut out).unwrap();
        out
    }

    fn segment_header() -> Vec<u8> {
        vec![0x18, 0x53, 0x80, 0x67, 0xFF]
    }

    fn element_bytes(id: u32, value: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        encode_element(id, value, &mut out).unwrap();
        out
    }

    #[test]
    fn test_doc_type_validation() {
        let mut demuxer = WebmDemuxer::new();
        demuxer.push(&ebml_header("webm"));
        assert!(demuxer.poll().unwrap().is_some());

        let mut demuxer = WebmDemuxer::new();
        demuxer.push(&ebml_header("matroska"));
        assert!(matches!(
            demuxer.poll(),
            Err(WebmError::NotWebm(doc)) if doc == "matroska"
        ));
    }

    #[test]
    fn test_info_view() {
        let info = Value::Master(vec![
            child(ids::TIMECODE_SCALE, Value::UInt(1_000_000)),
            child(ids::MUXING_APP, Value::Utf8("webmio".into())),
            child(ids::DURATION, Value::Float(1_234.0)),
        ]);

        let mut demuxer = WebmDemuxer::new();
        demuxer.push(&ebml_header("webm"));
        demuxer.push(&segment_header());
        demuxer.push(&element_bytes(ids::INFO, &info));

        while demuxer.poll().unwrap().is_some() {}

        assert_eq!(demuxer.info.timecode_scale, 1_000_000);
        assert_eq!(demuxer.info.muxing_app.as_deref(), Some("webmio"));
        assert_eq!(demuxer.info.duration, Some(1_234.0));
        assert!(demuxer.info.title.is_none());
    }

    #[test]
    fn test_tracks_view() {
        let tracks = Value::Master(vec![child(
            ids::TRACK_ENTRY,
            Value::Master(vec![
                child(ids::TRACK_NUMBER, Value::UInt(1)),
                child(ids::TRACK_UID, Value::UInt(1)),
                child(ids::TRACK_TYPE, Value::TrackType(TrackType::Video)),
                child(ids::CODEC_ID, Value::CodecId(CodecId::Vp9)),
                child(
                    ids::VIDEO,
                    Value::Master(vec![
                        child(ids::PIXEL_WIDTH, Value::UInt(1920)),
                        child(ids::PIXEL_HEIGHT, Value::UInt(1080)),
                    ]),
                ),
            ]),
        )]);

        let mut demuxer = WebmDemuxer::new();
        demuxer.push(&ebml_header("webm"));
        demuxer.push(&segment_header());
        demuxer.push(&element_bytes(ids::TRACKS, &tracks));

        while demuxer.poll().unwrap().is_some() {}

        assert_eq!(demuxer.num_tracks(), 1);
        let track = demuxer.track(1).unwrap();
        assert_eq!(track.track_type, TrackType::Video);
        assert_eq!(track.codec, CodecId::Vp9);
        let video = track.video.as_ref().unwrap();
        assert_eq!((video.width, video.height), (1920, 1080));
    }

    #[test]
    fn test_elements_stream_in_file_order() {
        let mut data = ebml_header("webm");
        data.extend_from_slice(&segment_header());
        data.extend_from_slice(&element_bytes(
            ids::INFO,
            &Value::Master(vec![child(ids::TIMECODE_SCALE, Value::UInt(1_000_000))]),
        ));

        let mut cluster_payload = Vec::new();
        encode_element(ids::TIMECODE, &Value::UInt(0), &mut cluster_payload).unwrap();
        let mut cluster = Vec::new();
        write_element_id(&mut cluster, ids::CLUSTER);
        let (size, size_len) = encode_vint(cluster_payload.len() as u64).unwrap();
        cluster.extend_from_slice(&size[..size_len]);
        cluster.extend_from_slice(&cluster_payload);
        data.extend_from_slice(&cluster);

        let mut demuxer = WebmDemuxer::new();
        demuxer.push(&data);

        let mut names = Vec::new();
        while let Some(element) = demuxer.poll().unwrap() {
            names.push(element.name());
        }
        assert_eq!(names, ["EBML", "Info", "Cluster"]);
    }
}
