//! # webmio
//!
//! Streaming WebM muxing and demuxing.
//!
//! WebM is a constrained Matroska profile: DocType "webm", Opus/VP8/VP9
//! payloads, SimpleBlocks only. This crate ties the webmio stack together:
//! the incremental EBML layer from `webmio-ebml` and the keyframe/header
//! inspection from `webmio-codec` feed a clustering muxer and a push-based
//! demuxer.
//!
//! ## Example: muxing
//!
//! ```no_run
//! use std::io::Cursor;
//! use webmio::{AudioTrackConfig, Frame, TrackCodec, VideoTrackConfig, WebmMuxer};
//!
//! let mut muxer = WebmMuxer::new(Cursor::new(Vec::new()));
//!
//! let video = muxer
//!     .add_video_track(VideoTrackConfig::new(TrackCodec::Vp8, 1920, 1080))
//!     .unwrap();
//! let audio = muxer
//!     .add_audio_track(AudioTrackConfig::opus(2, 48_000.0))
//!     .unwrap();
//!
//! muxer.write_header().unwrap();
//!
//! // One coded frame (or Opus packet) per call, per track
//! muxer.push_frame(video, Frame::with_pts(0, vec![/* VP8 frame */])).unwrap();
//! muxer.push_frame(audio, Frame::with_pts(0, vec![/* Opus packet */])).unwrap();
//!
//! muxer.end_track(video).unwrap();
//! muxer.end_track(audio).unwrap();
//! muxer.finalize().unwrap();
//! ```
//!
//! ## Example: demuxing
//!
//! ```no_run
//! use webmio::WebmDemuxer;
//!
//! let mut demuxer = WebmDemuxer::new();
//! demuxer.push(&[/* bytes as they arrive */]);
//!
//! while let Some(element) = demuxer.poll().unwrap() {
//!     println!("{}", element.name());
//! }
//! ```

#![warn(missing_docs)]

pub mod cluster;
pub mod demuxer;
pub mod error;
pub mod muxer;
pub mod track;

pub use demuxer::{AudioInfo, SegmentInfo, TrackInfo, VideoInfo, WebmDemuxer};
pub use error::{Result, WebmError};
pub use muxer::{MuxerConfig, WebmMuxer};
pub use track::{AudioTrackConfig, Frame, TrackCodec, VideoTrackConfig, TICK_NS};

// Re-export the layers the public API leans on
pub use webmio_codec::{is_video_keyframe, VideoCodec};
pub use webmio_ebml::{Element, SimpleBlock, Value};

/// WebM codec ID strings.
pub mod codec_ids {
    /// VP8 video.
    pub const V_VP8: &str = "V_VP8";
    /// VP9 video.
    pub const V_VP9: &str = "V_VP9";
    /// Opus audio.
    pub const A_OPUS: &str = "A_OPUS";
    /// Vorbis audio (recognized on ingest, rejected for output).
    pub const A_VORBIS: &str = "A_VORBIS";
}
