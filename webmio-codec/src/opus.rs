//! Opus identification header ("OpusHead") construction.
//!
//! WebM carries the 19-byte Opus ID header as the track's CodecPrivate.

use crate::error::{CodecError, Result};

/// Length of the ID header without an explicit channel mapping table.
pub const ID_HEADER_LEN: usize = 19;

/// The Opus identification header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdHeader {
    /// Channel count (1 or 2).
    pub channels: u8,
    /// Samples to skip at decoder start.
    pub pre_skip: u16,
    /// Original input sample rate, informational only.
    pub sample_rate: u32,
    /// Output gain in Q7.8 dB.
    pub output_gain: i16,
    /// Channel mapping family (0 = mono/stereo).
    pub channel_mapping_family: u8,
}

impl IdHeader {
    /// An ID header for the given channel count, remaining fields zeroed.
    ///
    /// Mapping family 0 covers exactly one and two channels; anything else
    /// is rejected.
    pub fn new(channels: u8) -> Result<Self> {
        if channels == 0 || channels > 2 {
            return Err(CodecError::UnsupportedChannelCount(channels));
        }

        Ok(Self {
            channels,
            pre_skip: 0,
            sample_rate: 0,
            output_gain: 0,
            channel_mapping_family: 0,
        })
    }

    /// Serialize to the 19-byte wire form.
    pub fn build(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(ID_HEADER_LEN);

        data.extend_from_slice(b"OpusHead");
        data.push(1); // version
        data.push(self.channels);
        data.extend_from_slice(&self.pre_skip.to_le_bytes());
        data.extend_from_slice(&self.sample_rate.to_le_bytes());
        data.extend_from_slice(&self.output_gain.to_le_bytes());
        data.push(self.channel_mapping_family);

        data
    }
}
