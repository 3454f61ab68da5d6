//! Cluster assembly: boundary policy, SimpleBlock framing, cue collection.
//!
//! Clusters are built compute-then-emit: children are serialized into the
//! in-progress payload as blocks arrive, and the finished Cluster element is
//! handed back as one contiguous byte run once a boundary closes it.

use crate::error::Result;
use crate::track::Block;
use webmio_ebml::write::encode_element;
use webmio_ebml::{ids, Child, SimpleBlock, Value};

/// Cluster size cap in bytes.
pub const MAX_CLUSTER_SIZE: usize = 5 * 1024 * 1024;

/// Cluster duration cap in ticks (five seconds of milliseconds).
pub const MAX_CLUSTER_DURATION: i64 = 5_000;

/// Largest cluster-relative timecode a SimpleBlock can carry.
const MAX_RELATIVE_TIMECODE: i64 = i16::MAX as i64;

/// A pending seek index entry for a cluster-opening video keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CuePoint {
    /// Absolute time in ticks.
    pub time: i64,
    /// Track that produced the keyframe.
    pub track: u64,
    /// Segment-relative byte offset of the cluster.
    pub position: u64,
}

#[derive(Debug)]
struct OpenCluster {
    /// Absolute tick of the first block.
    time: i64,
    /// Serialized children: Timecode, then SimpleBlocks.
    payload: Vec<u8>,
}

/// The cluster-in-progress and the accumulated cue list.
#[derive(Debug)]
pub(crate) struct ClusterEngine {
    open: Option<OpenCluster>,
    cues: Vec<CuePoint>,
    /// Whether the stream has a video track; audio-only streams skip the
    /// keyframe boundary rule.
    have_video: bool,
}

impl ClusterEngine {
    pub fn new(have_video: bool) -> Self {
        Self {
            open: None,
            cues: Vec::new(),
            have_video,
        }
    }

    /// True if a new cluster must start before this block is appended.
    pub fn needs_boundary(&self, block: &Block) -> bool {
        let Some(open) = &self.open else {
            return true;
        };

        open.payload.len() >= MAX_CLUSTER_SIZE
            || block.ticks - open.time >= MAX_CLUSTER_DURATION
            || (self.have_video && block.video && block.keyframe)
    }

    /// Serialize and close the cluster in progress, if any.
    pub fn finish(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(open) = self.open.take() else {
            return Ok(None);
        };

        let mut out = Vec::with_capacity(open.payload.len() + 16);
        webmio_ebml::write::write_element_id(&mut out, ids::CLUSTER);
        let (size, size_len) = webmio_ebml::encode_vint(open.payload.len() as u64)?;
        out.extend_from_slice(&size[..size_len]);
        out.extend_from_slice(&open.payload);

        tracing::debug!(
            time = open.time,
            bytes = out.len(),
            "cluster flushed"
        );
        Ok(Some(out))
    }

    /// Open a new cluster whose Timecode is `time`.
    pub fn begin(&mut self, time: i64) -> Result<()> {
        debug_assert!(self.open.is_none());

        let mut payload = Vec::new();
        encode_element(ids::TIMECODE, &Value::UInt(time.max(0) as u64), &mut payload)?;
        self.open = Some(OpenCluster { time, payload });
        Ok(())
    }

    /// Frame `block` as a SimpleBlock and append it to the open cluster.
    pub fn append(&mut self, block: Block) -> Result<()> {
        let Some(open) = self.open.as_mut() else {
            return Err(crate::error::WebmError::InvalidState(
                "block appended without an open cluster".into(),
            ));
        };

        let relative = block.ticks - open.time;
        if relative > MAX_RELATIVE_TIMECODE {
            // The i16 wraps and the block lands at the wrong time; surface
            // it but keep the stream going.
            tracing::warn!(
                track = block.track,
                relative,
                "cluster-relative timecode overflows 16 bits"
            );
        }

        // Audio blocks are always keyframe-flagged
        let keyframe = block.keyframe || !block.video;
        let simple = SimpleBlock::new(block.track, relative as i16, keyframe, block.payload);
        encode_element(ids::SIMPLE_BLOCK, &Value::SimpleBlock(simple), &mut open.payload)?;
        Ok(())
    }

    /// Record a cue for a video keyframe that opened the cluster at
    /// `position` (Segment-relative).
    pub fn add_cue(&mut self, time: i64, track: u64, position: u64) {
        self.cues.push(CuePoint {
            time,
            track,
            position,
        });
    }

    pub fn has_cues(&self) -> bool {
        !self.cues.is_empty()
    }

    /// Build the Cues element value from the collected cue points.
    pub fn cues_value(&self) -> Value {
        let points = self
            .cues
            .iter()
            .map(|cue| Child {
                id: ids::CUE_POINT,
                value: Value::Master(vec![
                    Child {
                        id: ids::CUE_TIME,
                        value: Value::UInt(cue.time.max(0) as u64),
                    },
                    Child {
                        id: ids::CUE_TRACK_POSITIONS,
                        value: Value::Master(vec![
                            Child {
                                id: ids::CUE_TRACK,
                                value: Value::UInt(cue.track),
                            },
                            Child {
                                id: ids::CUE_CLUSTER_POSITION,
                                value: Value::UInt(cue.position),
                            },
                        ]),
                    },
                ]),
            })
            .collect();

        Value::Master(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webmio_ebml::{decode_element, parse_value, Decoded, ElementKind};

    fn block(track: u64, ticks: i64, video: bool, keyframe: bool) -> Block {
        Block {
            track,
            ticks,
            keyframe,
            video,
            payload: vec![0xAA],
        }
    }

    fn parse_cluster(bytes: &[u8]) -> Value {
        let Decoded::Element { id, kind, payload, .. } = decode_element(bytes).unwrap() else {
            panic!("expected a complete cluster");
        };
        assert_eq!(id, ids::CLUSTER);
        assert_eq!(kind, ElementKind::Master);
        parse_value(id, kind, payload).unwrap()
    }

    #[test]
    fn test_first_block_opens_cluster() {
        let engine = ClusterEngine::new(true);
        assert!(engine.needs_boundary(&block(1, 0, true, true)));
    }

    #[test]
    fn test_video_keyframe_forces_boundary() {
        let mut engine = ClusterEngine::new(true);
        engine.begin(0).unwrap();
        engine.append(block(1, 0, true, true)).unwrap();

        assert!(!engine.needs_boundary(&block(1, 33, true, false)));
        assert!(engine.needs_boundary(&block(1, 66, true, true)));
    }

    #[test]
    fn test_audio_only_ignores_keyframes() {
        let mut engine = ClusterEngine::new(false);
        engine.begin(0).unwrap();
        engine.append(block(1, 0, false, false)).unwrap();

        // Every audio block is keyframe-flagged, but that must not split
        assert!(!engine.needs_boundary(&block(1, 20, false, true)));
        // The five-second cap still does
        assert!(engine.needs_boundary(&block(1, 5_000, false, false)));
    }

    #[test]
    fn test_duration_cap() {
        let mut engine = ClusterEngine::new(true);
        engine.begin(100).unwrap();
        engine.append(block(1, 100, true, true)).unwrap();

        assert!(!engine.needs_boundary(&block(1, 5_099, true, false)));
        assert!(engine.needs_boundary(&block(1, 5_100, true, false)));
    }

    #[test]
    fn test_size_cap() {
        let mut engine = ClusterEngine::new(true);
        engine.begin(0).unwrap();

        let mut big = block(1, 0, true, true);
        big.payload = vec![0; MAX_CLUSTER_SIZE];
        engine.append(big).unwrap();

        assert!(engine.needs_boundary(&block(1, 1, true, false)));
    }

    #[test]
    fn test_cluster_layout() {
        let mut engine = ClusterEngine::new(true);
        engine.begin(40).unwrap();
        engine.append(block(1, 40, true, true)).unwrap();
        engine.append(block(2, 45, false, false)).unwrap();

        let bytes = engine.finish().unwrap().unwrap();
        let value = parse_cluster(&bytes);

        let children = value.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].id, ids::TIMECODE);
        assert_eq!(children[0].value, Value::UInt(40));

        let Value::SimpleBlock(first) = &children[1].value else {
            panic!("expected a SimpleBlock");
        };
        assert_eq!(first.track_number, 1);
        assert_eq!(first.timecode, 0);
        assert!(first.is_keyframe());

        let Value::SimpleBlock(second) = &children[2].value else {
            panic!("expected a SimpleBlock");
        };
        assert_eq!(second.track_number, 2);
        assert_eq!(second.timecode, 5);
        // Audio gets the keyframe flag even without one from the codec
        assert!(second.is_keyframe());
    }

    #[test]
    fn test_relative_overflow_wraps_but_continues() {
        // Past i16::MAX the timecode wraps; the engine warns and keeps going
        let mut engine = ClusterEngine::new(false);
        engine.begin(0).unwrap();
        engine.append(block(1, 40_000, false, false)).unwrap();

        let bytes = engine.finish().unwrap().unwrap();
        let value = parse_cluster(&bytes);
        let Value::SimpleBlock(b) = &value.children()[1].value else {
            panic!("expected a SimpleBlock");
        };
        assert_eq!(b.timecode, 40_000i64 as i16);
    }

    #[test]
    fn test_finish_empty_engine() {
        let mut engine = ClusterEngine::new(true);
        assert!(engine.finish().unwrap().is_none());
    }

    #[test]
    fn test_cues_value() {
        let mut engine = ClusterEngine::new(true);
        engine.add_cue(0, 1, 123);
        engine.add_cue(100, 1, 4_567);

        let mut bytes = Vec::new();
        encode_element(ids::CUES, &engine.cues_value(), &mut bytes).unwrap();

        let Decoded::Element { id, kind, payload, .. } = decode_element(&bytes).unwrap() else {
            panic!("expected a complete element");
        };
        let value = parse_value(id, kind, payload).unwrap();

        let points: Vec<_> = value.find_all(ids::CUE_POINT).collect();
        assert_eq!(points.len(), 2);
        assert_eq!(
            points[1].find(ids::CUE_TIME).and_then(Value::as_uint),
            Some(100)
        );
        let positions = points[1].find(ids::CUE_TRACK_POSITIONS).unwrap();
        assert_eq!(
            positions
                .find(ids::CUE_CLUSTER_POSITION)
                .and_then(Value::as_uint),
            Some(4_567)
        );
    }
}
