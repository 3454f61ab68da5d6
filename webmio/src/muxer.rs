//! The streaming WebM muxer.
//!
//! Frames from any number of tracks are normalized to a millisecond tick
//! clock, merged in time order through a k-way heap, packed into clusters by
//! the boundary policy, and written out in strict Matroska order: EBML
//! header, Segment, SeekHead, Info, Tracks, Clusters, Cues. The Segment
//! size, Duration and SeekHead are patched in place on finalize.

use crate::cluster::ClusterEngine;
use crate::error::{Result, WebmError};
use crate::track::{
    AudioTrackConfig, Block, Frame, Track, TrackKind, VideoTrackConfig, TICK_NS,
};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io::{Seek, SeekFrom, Write};
use webmio_codec::opus;
use webmio_ebml::write::{encode_element, write_element_id};
use webmio_ebml::{encode_vint, encode_vint_fixed, ids, vint_length, Child, CodecId, TrackType, Value};

/// Bytes reserved at the start of the Segment for the SeekHead.
const SEEK_HEAD_RESERVATION: usize = 100;

/// Muxer configuration.
#[derive(Debug, Clone)]
pub struct MuxerConfig {
    /// Segment title.
    pub title: Option<String>,
    /// Muxing application name.
    pub muxing_app: String,
    /// Writing application name.
    pub writing_app: String,
    /// DateUTC in nanoseconds since 2001-01-01T00:00:00Z.
    pub date_utc: Option<i64>,
    /// Whether to collect and emit Cues.
    pub write_cues: bool,
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self {
            title: None,
            muxing_app: "webmio".to_string(),
            writing_app: "webmio".to_string(),
            date_utc: None,
            write_cues: true,
        }
    }
}

impl MuxerConfig {
    /// A configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the segment title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the writing application name.
    pub fn with_writing_app(mut self, app: impl Into<String>) -> Self {
        self.writing_app = app.into();
        self
    }

    /// Set the DateUTC stamp.
    pub fn with_date_utc(mut self, ns_since_millennium: i64) -> Self {
        self.date_utc = Some(ns_since_millennium);
        self
    }

    /// Enable or disable cue generation.
    pub fn with_cues(mut self, enabled: bool) -> Self {
        self.write_cues = enabled;
        self
    }
}

/// Muxer lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MuxerState {
    /// Accepting track registrations.
    Initial,
    /// Header written, ready for frames.
    Ready,
    /// Frames flowing.
    Writing,
    /// Trailer written; the muxer is done.
    Finalized,
}

/// Merge order: earlier first, video before audio on ties, then by track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct MergeKey {
    ticks: i64,
    rank: u8,
    track: u64,
}

impl MergeKey {
    fn for_block(block: &Block) -> Self {
        Self {
            ticks: block.ticks,
            rank: if block.video { 0 } else { 1 },
            track: block.track,
        }
    }
}

/// Streaming WebM muxer over a seekable writer.
pub struct WebmMuxer<W: Write + Seek> {
    writer: W,
    config: MuxerConfig,
    state: MuxerState,
    tracks: Vec<Track>,
    engine: ClusterEngine,
    /// Holds the merge key of each non-empty track queue's front block.
    heap: BinaryHeap<Reverse<MergeKey>>,
    /// File offset of the first byte after the Segment header.
    segment_start: u64,
    /// File offset of the Segment's eight-byte size slot.
    segment_size_pos: u64,
    /// File offset of the Duration float payload.
    duration_pos: u64,
    /// Segment-relative offsets for the SeekHead.
    info_pos: u64,
    tracks_pos: u64,
    cues_pos: Option<u64>,
    /// Largest tick written, for the Duration patch.
    max_ticks: i64,
}

impl<W: Write + Seek> WebmMuxer<W> {
    /// A muxer writing to `writer` with default configuration.
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, MuxerConfig::default())
    }

    /// A muxer writing to `writer`.
    pub fn with_config(writer: W, config: MuxerConfig) -> Self {
        Self {
            writer,
            config,
            state: MuxerState::Initial,
            tracks: Vec::new(),
            engine: ClusterEngine::new(false),
            heap: BinaryHeap::new(),
            segment_start: 0,
            segment_size_pos: 0,
            duration_pos: 0,
            info_pos: 0,
            tracks_pos: 0,
            cues_pos: None,
            max_ticks: 0,
        }
    }

    /// Consume the muxer and return the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Register a video track. Returns the 1-based track number.
    pub fn add_video_track(&mut self, config: VideoTrackConfig) -> Result<u64> {
        if self.state != MuxerState::Initial {
            return Err(WebmError::TracksFrozen);
        }
        if !config.codec.is_video() {
            return Err(WebmError::UnsupportedCodec(
                config.codec.codec_id().to_string(),
            ));
        }

        let number = self.tracks.len() as u64 + 1;
        self.tracks.push(Track::new(number, TrackKind::Video(config)));
        Ok(number)
    }

    /// Register an Opus audio track. Returns the 1-based track number.
    pub fn add_audio_track(&mut self, config: AudioTrackConfig) -> Result<u64> {
        if self.state != MuxerState::Initial {
            return Err(WebmError::TracksFrozen);
        }
        // Channel counts outside mapping family 0 fail here, at declaration
        opus::IdHeader::new(config.channels)?;

        let number = self.tracks.len() as u64 + 1;
        self.tracks.push(Track::new(number, TrackKind::Audio(config)));
        Ok(number)
    }

    /// Write the EBML header, Segment header, SeekHead reservation, Info and
    /// Tracks. Called implicitly by the first frame if needed.
    pub fn write_header(&mut self) -> Result<()> {
        if self.state != MuxerState::Initial {
            return Err(WebmError::InvalidState("header already written".into()));
        }
        if self.tracks.is_empty() {
            return Err(WebmError::InvalidState("no tracks configured".into()));
        }

        self.engine = ClusterEngine::new(self.tracks.iter().any(Track::is_video));

        self.write_ebml_header()?;

        // Segment with an eight-byte size slot, patched on finalize. Until
        // then it reads as unknown size, which is the valid streamed form.
        let mut out = Vec::new();
        write_element_id(&mut out, ids::SEGMENT);
        self.writer.write_all(&out)?;
        self.segment_size_pos = self.position()?;
        self.writer
            .write_all(&[0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF])?;
        self.segment_start = self.position()?;

        // SeekHead lands here on finalize
        let void = void_element(SEEK_HEAD_RESERVATION)?;
        self.writer.write_all(&void)?;

        self.info_pos = self.position()? - self.segment_start;
        self.write_info()?;

        self.tracks_pos = self.position()? - self.segment_start;
        self.write_tracks()?;

        self.state = MuxerState::Ready;
        Ok(())
    }

    /// Feed one coded frame for `track_number`.
    ///
    /// Frames are merged across tracks and written as clusters complete; a
    /// track whose cached block is missing stalls the merge until its next
    /// frame (or end-of-track) arrives.
    pub fn push_frame(&mut self, track_number: u64, frame: Frame) -> Result<()> {
        if self.state == MuxerState::Initial {
            self.write_header()?;
        }
        if self.state == MuxerState::Finalized {
            return Err(WebmError::InvalidState("muxer already finalized".into()));
        }

        let index = self.track_index(track_number)?;
        if self.tracks[index].ended {
            return Err(WebmError::InvalidState(format!(
                "track {track_number} already ended"
            )));
        }

        let ticks = self.tracks[index].normalize(&frame)?;
        let video = self.tracks[index].is_video();
        let keyframe = match self.tracks[index].codec().video_codec() {
            Some(codec) => webmio_codec::is_video_keyframe(codec, &frame.payload),
            None => false,
        };

        let block = Block {
            track: track_number,
            ticks,
            keyframe,
            video,
            payload: frame.payload,
        };

        if self.tracks[index].pending.is_empty() {
            self.heap.push(Reverse(MergeKey::for_block(&block)));
        }
        self.tracks[index].pending.push_back(block);

        self.state = MuxerState::Writing;
        self.drain()
    }

    /// Close a track's input. Its remaining cached blocks still merge.
    pub fn end_track(&mut self, track_number: u64) -> Result<()> {
        let index = self.track_index(track_number)?;
        self.tracks[index].ended = true;
        if self.state == MuxerState::Writing {
            self.drain()?;
        }
        Ok(())
    }

    /// Drain the merge, flush the final cluster, emit Cues and patch the
    /// Segment size, Duration and SeekHead.
    pub fn finalize(&mut self) -> Result<()> {
        if self.state == MuxerState::Finalized {
            return Ok(());
        }
        if self.state == MuxerState::Initial {
            return Err(WebmError::InvalidState("no data written".into()));
        }

        for track in &mut self.tracks {
            track.ended = true;
        }
        self.drain()?;

        if let Some(cluster) = self.engine.finish()? {
            self.writer.write_all(&cluster)?;
        }

        if self.config.write_cues && self.engine.has_cues() {
            self.cues_pos = Some(self.position()? - self.segment_start);
            let mut out = Vec::new();
            encode_element(ids::CUES, &self.engine.cues_value(), &mut out)?;
            self.writer.write_all(&out)?;
        }

        let end = self.position()?;

        // Patch Duration
        self.writer.seek(SeekFrom::Start(self.duration_pos))?;
        self.writer
            .write_all(&(self.max_ticks as f64).to_be_bytes())?;

        // Patch the Segment size slot
        let segment_size = end - self.segment_start;
        self.writer.seek(SeekFrom::Start(self.segment_size_pos))?;
        self.writer.write_all(&encode_vint_fixed(segment_size)?)?;

        self.write_seek_head()?;

        self.writer.seek(SeekFrom::Start(end))?;
        self.state = MuxerState::Finalized;
        Ok(())
    }

    fn track_index(&self, track_number: u64) -> Result<usize> {
        let index = track_number.wrapping_sub(1) as usize;
        if index >= self.tracks.len() {
            return Err(WebmError::UnknownTrack(track_number));
        }
        Ok(index)
    }

    /// Pop merged blocks while every active track has a cached block.
    fn drain(&mut self) -> Result<()> {
        loop {
            let starved = self
                .tracks
                .iter()
                .any(|track| !track.ended && track.pending.is_empty());
            if starved {
                return Ok(());
            }

            let Some(Reverse(key)) = self.heap.pop() else {
                return Ok(());
            };
            let index = (key.track - 1) as usize;

            let Some(block) = self.tracks[index].pending.pop_front() else {
                continue;
            };
            if let Some(next) = self.tracks[index].pending.front() {
                self.heap.push(Reverse(MergeKey::for_block(next)));
            }

            self.write_block(block)?;
        }
    }

    /// Route one merged block through the cluster engine.
    fn write_block(&mut self, block: Block) -> Result<()> {
        self.max_ticks = self.max_ticks.max(block.ticks);

        if self.engine.needs_boundary(&block) {
            if let Some(cluster) = self.engine.finish()? {
                self.writer.write_all(&cluster)?;
            }

            let cluster_pos = self.position()? - self.segment_start;
            self.engine.begin(block.ticks)?;

            if self.config.write_cues && block.video && block.keyframe {
                self.engine.add_cue(block.ticks, block.track, cluster_pos);
            }
        }

        self.engine.append(block)
    }

    fn write_ebml_header(&mut self) -> Result<()> {
        let header = Value::Master(vec![
            child(ids::EBML_VERSION, Value::UInt(1)),
            child(ids::EBML_READ_VERSION, Value::UInt(1)),
            child(ids::EBML_MAX_ID_LENGTH, Value::UInt(4)),
            child(ids::EBML_MAX_SIZE_LENGTH, Value::UInt(8)),
            child(ids::DOC_TYPE, Value::Ascii("webm".to_string())),
            child(ids::DOC_TYPE_VERSION, Value::UInt(4)),
            child(ids::DOC_TYPE_READ_VERSION, Value::UInt(2)),
        ]);

        let mut out = Vec::new();
        encode_element(ids::EBML, &header, &mut out)?;
        self.writer.write_all(&out)?;
        Ok(())
    }

    fn write_info(&mut self) -> Result<()> {
        let mut payload = Vec::new();
        encode_element(
            ids::TIMECODE_SCALE,
            &Value::UInt(TICK_NS as u64),
            &mut payload,
        )?;
        encode_element(
            ids::MUXING_APP,
            &Value::Utf8(self.config.muxing_app.clone()),
            &mut payload,
        )?;
        encode_element(
            ids::WRITING_APP,
            &Value::Utf8(self.config.writing_app.clone()),
            &mut payload,
        )?;
        if let Some(title) = &self.config.title {
            encode_element(ids::TITLE, &Value::Utf8(title.clone()), &mut payload)?;
        }
        if let Some(date) = self.config.date_utc {
            encode_element(ids::DATE_UTC, &Value::Date(date), &mut payload)?;
        }

        // Duration slot: a fixed eight-byte float patched at end of stream
        let duration_offset = payload.len() + 3;
        write_element_id(&mut payload, ids::DURATION);
        payload.push(0x88);
        payload.extend_from_slice(&[0u8; 8]);

        let info_start = self.position()?;
        let mut out = Vec::new();
        write_element_id(&mut out, ids::INFO);
        let (size, size_len) = encode_vint(payload.len() as u64)?;
        out.extend_from_slice(&size[..size_len]);
        out.extend_from_slice(&payload);
        self.writer.write_all(&out)?;

        self.duration_pos = info_start + (4 + size_len + duration_offset) as u64;
        Ok(())
    }

    fn write_tracks(&mut self) -> Result<()> {
        let mut entries = Vec::new();
        for track in &self.tracks {
            entries.push(child(ids::TRACK_ENTRY, track_entry_value(track)?));
        }

        let mut out = Vec::new();
        encode_element(ids::TRACKS, &Value::Master(entries), &mut out)?;
        self.writer.write_all(&out)?;
        Ok(())
    }

    fn write_seek_head(&mut self) -> Result<()> {
        let mut entries = vec![
            seek_entry(ids::INFO, self.info_pos),
            seek_entry(ids::TRACKS, self.tracks_pos),
        ];
        if let Some(pos) = self.cues_pos {
            entries.push(seek_entry(ids::CUES, pos));
        }

        let mut out = Vec::new();
        encode_element(ids::SEEK_HEAD, &Value::Master(entries), &mut out)?;

        // The SeekHead overwrites its reservation; whatever is left becomes
        // a fresh Void so the gap still parses.
        let remaining = SEEK_HEAD_RESERVATION.saturating_sub(out.len());
        if out.len() > SEEK_HEAD_RESERVATION || remaining == 1 {
            tracing::warn!(size = out.len(), "seek head does not fit its reservation");
            return Ok(());
        }
        if remaining >= 2 {
            out.extend_from_slice(&void_element(remaining)?);
        }

        self.writer.seek(SeekFrom::Start(self.segment_start))?;
        self.writer.write_all(&out)?;
        Ok(())
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.writer.stream_position()?)
    }
}

fn child(id: u32, value: Value) -> Child {
    Child { id, value }
}

fn seek_entry(id: u32, position: u64) -> Child {
    let mut id_bytes = Vec::new();
    write_element_id(&mut id_bytes, id);

    child(
        ids::SEEK,
        Value::Master(vec![
            child(ids::SEEK_ID, Value::Binary(id_bytes)),
            child(ids::SEEK_POSITION, Value::UInt(position)),
        ]),
    )
}

/// A Void element of exactly `total` bytes (header included).
fn void_element(total: usize) -> Result<Vec<u8>> {
    debug_assert!(total >= 2);
    let content = total - 1 - vint_length((total - 2) as u64);

    let mut out = Vec::with_capacity(total);
    encode_element(ids::VOID, &Value::Void(content as u64), &mut out)?;
    Ok(out)
}

fn track_entry_value(track: &Track) -> Result<Value> {
    let mut children = vec![
        child(ids::TRACK_NUMBER, Value::UInt(track.number)),
        child(ids::TRACK_UID, Value::UInt(track.number)),
    ];

    match &track.kind {
        TrackKind::Video(v) => {
            children.push(child(ids::TRACK_TYPE, Value::TrackType(TrackType::Video)));
            children.push(child(ids::FLAG_LACING, Value::UInt(0)));
            children.push(child(
                ids::CODEC_ID,
                Value::CodecId(CodecId::from(v.codec.codec_id())),
            ));
            if let Some(name) = &v.name {
                children.push(child(ids::NAME, Value::Utf8(name.clone())));
            }
            if let Some(language) = &v.language {
                children.push(child(ids::LANGUAGE, Value::Ascii(language.clone())));
            }
            if let Some(fps) = v.frame_rate {
                let duration_ns = (1_000_000_000.0 / fps) as u64;
                children.push(child(ids::DEFAULT_DURATION, Value::UInt(duration_ns)));
            }

            let mut video = vec![
                child(ids::PIXEL_WIDTH, Value::UInt(v.width as u64)),
                child(ids::PIXEL_HEIGHT, Value::UInt(v.height as u64)),
            ];
            if let (Some(dw), Some(dh)) = (v.display_width, v.display_height) {
                video.push(child(ids::DISPLAY_WIDTH, Value::UInt(dw as u64)));
                video.push(child(ids::DISPLAY_HEIGHT, Value::UInt(dh as u64)));
                // DisplayUnit 0: pixels
                video.push(child(ids::DISPLAY_UNIT, Value::UInt(0)));
            }
            children.push(child(ids::VIDEO, Value::Master(video)));
        }
        TrackKind::Audio(a) => {
            children.push(child(ids::TRACK_TYPE, Value::TrackType(TrackType::Audio)));
            children.push(child(ids::FLAG_LACING, Value::UInt(0)));
            children.push(child(
                ids::CODEC_ID,
                Value::CodecId(CodecId::Opus),
            ));
            if let Some(name) = &a.name {
                children.push(child(ids::NAME, Value::Utf8(name.clone())));
            }
            if let Some(language) = &a.language {
                children.push(child(ids::LANGUAGE, Value::Ascii(language.clone())));
            }
            if a.codec_delay > 0 {
                children.push(child(ids::CODEC_DELAY, Value::UInt(a.codec_delay)));
            }
            if a.seek_pre_roll > 0 {
                children.push(child(ids::SEEK_PRE_ROLL, Value::UInt(a.seek_pre_roll)));
            }
            children.push(child(
                ids::CODEC_PRIVATE,
                Value::Binary(opus::IdHeader::new(a.channels)?.build()),
            ));

            let mut audio = vec![
                child(ids::SAMPLING_FREQUENCY, Value::Float(a.sample_rate)),
                child(ids::CHANNELS, Value::UInt(a.channels as u64)),
            ];
            if let Some(bits) = a.bit_depth {
                audio.push(child(ids::BIT_DEPTH, Value::UInt(bits as u64)));
            }
            children.push(child(ids::AUDIO, Value::Master(audio)));
        }
    }

    Ok(Value::Master(children))
}
