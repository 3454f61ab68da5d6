//! Muxer track configuration and per-track ingest state.

use crate::error::{Result, WebmError};
use std::collections::VecDeque;
use webmio_codec::VideoCodec;

/// Nanoseconds per output tick (the Info TimecodeScale): one millisecond.
pub const TICK_NS: i64 = 1_000_000;

/// Codecs the muxer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackCodec {
    /// VP8 video.
    Vp8,
    /// VP9 video.
    Vp9,
    /// Opus audio.
    Opus,
}

impl TrackCodec {
    /// The Matroska codec ID string.
    pub fn codec_id(&self) -> &'static str {
        match self {
            TrackCodec::Vp8 => crate::codec_ids::V_VP8,
            TrackCodec::Vp9 => crate::codec_ids::V_VP9,
            TrackCodec::Opus => crate::codec_ids::A_OPUS,
        }
    }

    /// True for the video codecs.
    pub fn is_video(&self) -> bool {
        matches!(self, TrackCodec::Vp8 | TrackCodec::Vp9)
    }

    pub(crate) fn video_codec(&self) -> Option<VideoCodec> {
        match self {
            TrackCodec::Vp8 => Some(VideoCodec::Vp8),
            TrackCodec::Vp9 => Some(VideoCodec::Vp9),
            TrackCodec::Opus => None,
        }
    }
}

/// Video track configuration.
#[derive(Debug, Clone)]
pub struct VideoTrackConfig {
    /// Video codec.
    pub codec: TrackCodec,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Display width in pixels (for aspect ratio).
    pub display_width: Option<u32>,
    /// Display height in pixels.
    pub display_height: Option<u32>,
    /// Frame rate, used to derive DefaultDuration.
    pub frame_rate: Option<f64>,
    /// Track name.
    pub name: Option<String>,
    /// Language code (ISO 639-2).
    pub language: Option<String>,
}

impl VideoTrackConfig {
    /// A video track with the given codec and pixel dimensions.
    pub fn new(codec: TrackCodec, width: u32, height: u32) -> Self {
        Self {
            codec,
            width,
            height,
            display_width: None,
            display_height: None,
            frame_rate: None,
            name: None,
            language: None,
        }
    }

    /// Set the display dimensions.
    pub fn with_display_size(mut self, width: u32, height: u32) -> Self {
        self.display_width = Some(width);
        self.display_height = Some(height);
        self
    }

    /// Set the frame rate.
    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        self.frame_rate = Some(fps);
        self
    }

    /// Set the track name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the language code.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Opus audio track configuration.
#[derive(Debug, Clone)]
pub struct AudioTrackConfig {
    /// Channel count (1 or 2).
    pub channels: u8,
    /// Sampling frequency in Hz.
    pub sample_rate: f64,
    /// Bits per sample.
    pub bit_depth: Option<u32>,
    /// Codec delay in nanoseconds.
    pub codec_delay: u64,
    /// Seek pre-roll in nanoseconds.
    pub seek_pre_roll: u64,
    /// Track name.
    pub name: Option<String>,
    /// Language code (ISO 639-2).
    pub language: Option<String>,
}

impl AudioTrackConfig {
    /// An Opus track with the given channel count and sample rate.
    pub fn opus(channels: u8, sample_rate: f64) -> Self {
        Self {
            channels,
            sample_rate,
            bit_depth: None,
            codec_delay: 0,
            seek_pre_roll: 0,
            name: None,
            language: None,
        }
    }

    /// Set the bit depth.
    pub fn with_bit_depth(mut self, bits: u32) -> Self {
        self.bit_depth = Some(bits);
        self
    }

    /// Set the codec delay in nanoseconds.
    pub fn with_codec_delay(mut self, ns: u64) -> Self {
        self.codec_delay = ns;
        self
    }

    /// Set the seek pre-roll in nanoseconds.
    pub fn with_seek_pre_roll(mut self, ns: u64) -> Self {
        self.seek_pre_roll = ns;
        self
    }

    /// Set the track name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the language code.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// A coded frame handed to the muxer.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Presentation timestamp in nanoseconds.
    pub pts: Option<i64>,
    /// Decode timestamp in nanoseconds.
    pub dts: Option<i64>,
    /// One coded frame (VP8/VP9) or one Opus packet.
    pub payload: Vec<u8>,
}

impl Frame {
    /// A frame with a presentation timestamp.
    pub fn with_pts(pts: i64, payload: Vec<u8>) -> Self {
        Self {
            pts: Some(pts),
            dts: None,
            payload,
        }
    }

    /// A frame with only a decode timestamp.
    pub fn with_dts(dts: i64, payload: Vec<u8>) -> Self {
        Self {
            pts: None,
            dts: Some(dts),
            payload,
        }
    }
}

/// A normalized block waiting in the merge.
#[derive(Debug, Clone)]
pub(crate) struct Block {
    pub track: u64,
    /// Absolute timestamp in ticks.
    pub ticks: i64,
    pub keyframe: bool,
    pub video: bool,
    pub payload: Vec<u8>,
}

/// Which timestamp drives a track's clock. Fixed by the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClockSource {
    Pts,
    Dts,
}

/// Track kind with its configuration.
#[derive(Debug, Clone)]
pub(crate) enum TrackKind {
    Video(VideoTrackConfig),
    Audio(AudioTrackConfig),
}

/// Per-track muxer state.
#[derive(Debug)]
pub(crate) struct Track {
    pub number: u64,
    pub kind: TrackKind,
    /// Blocks waiting to merge; the front is the cached block.
    pub pending: VecDeque<Block>,
    pub ended: bool,
    clock: Option<(ClockSource, i64)>,
    last_ticks: Option<i64>,
}

impl Track {
    pub fn new(number: u64, kind: TrackKind) -> Self {
        Self {
            number,
            kind,
            pending: VecDeque::new(),
            ended: false,
            clock: None,
            last_ticks: None,
        }
    }

    pub fn codec(&self) -> TrackCodec {
        match &self.kind {
            TrackKind::Video(v) => v.codec,
            TrackKind::Audio(_) => TrackCodec::Opus,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self.kind, TrackKind::Video(_))
    }

    /// Convert a frame's timestamp to absolute output ticks.
    ///
    /// The first frame fixes both the clock source (pts, or dts when pts is
    /// absent) and the offset subtracted from every later timestamp.
    pub fn normalize(&mut self, frame: &Frame) -> Result<i64> {
        let (source, offset) = match self.clock {
            Some(clock) => clock,
            None => {
                let clock = if let Some(pts) = frame.pts {
                    (ClockSource::Pts, pts)
                } else if let Some(dts) = frame.dts {
                    (ClockSource::Dts, dts)
                } else {
                    return Err(WebmError::MissingTimestamp { track: self.number });
                };
                self.clock = Some(clock);
                clock
            }
        };

        let ts = match source {
            ClockSource::Pts => frame.pts,
            ClockSource::Dts => frame.dts,
        }
        .ok_or(WebmError::MissingTimestamp { track: self.number })?;

        let ticks = (ts - offset) / TICK_NS;

        if let Some(prev) = self.last_ticks {
            if ticks < prev {
                return Err(WebmError::NonMonotonicTimestamp {
                    track: self.number,
                    prev,
                    next: ticks,
                });
            }
        }
        self.last_ticks = Some(ticks);

        Ok(ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio_track() -> Track {
        Track::new(1, TrackKind::Audio(AudioTrackConfig::opus(2, 48_000.0)))
    }

    #[test]
    fn test_first_frame_fixes_offset() {
        let mut track = audio_track();

        // 2s, 2.02s, 2.04s in nanoseconds
        let t0 = track
            .normalize(&Frame::with_pts(2_000_000_000, vec![]))
            .unwrap();
        let t1 = track
            .normalize(&Frame::with_pts(2_020_000_000, vec![]))
            .unwrap();
        let t2 = track
            .normalize(&Frame::with_pts(2_040_000_000, vec![]))
            .unwrap();

        assert_eq!([t0, t1, t2], [0, 20, 40]);
    }

    #[test]
    fn test_dts_fallback_is_sticky() {
        let mut track = audio_track();

        let t0 = track.normalize(&Frame::with_dts(0, vec![])).unwrap();
        assert_eq!(t0, 0);

        // Once the clock runs on dts, a frame with only a pts is rejected
        let err = track.normalize(&Frame::with_pts(20_000_000, vec![]));
        assert!(matches!(err, Err(WebmError::MissingTimestamp { track: 1 })));
    }

    #[test]
    fn test_no_timestamp_rejected() {
        let mut track = audio_track();
        let frame = Frame {
            pts: None,
            dts: None,
            payload: vec![],
        };
        assert!(matches!(
            track.normalize(&frame),
            Err(WebmError::MissingTimestamp { track: 1 })
        ));
    }

    #[test]
    fn test_backwards_time_rejected() {
        let mut track = audio_track();
        track.normalize(&Frame::with_pts(0, vec![])).unwrap();
        track.normalize(&Frame::with_pts(40_000_000, vec![])).unwrap();

        assert!(matches!(
            track.normalize(&Frame::with_pts(20_000_000, vec![])),
            Err(WebmError::NonMonotonicTimestamp {
                track: 1,
                prev: 40,
                next: 20,
            })
        ));
    }

    #[test]
    fn test_codec_ids() {
        assert_eq!(TrackCodec::Vp8.codec_id(), "V_VP8");
        assert_eq!(TrackCodec::Vp9.codec_id(), "V_VP9");
        assert_eq!(TrackCodec::Opus.codec_id(), "A_OPUS");
        assert!(TrackCodec::Vp9.is_video());
        assert!(!TrackCodec::Opus.is_video());
    }
}
