//! Incremental, push-driven parsing of a WebM byte stream.
//!
//! The parser owns a byte accumulator fed in arbitrarily-sized chunks and
//! yields one completed top-level element per poll, so the driving stage can
//! apply backpressure between elements. Elements come out in strict file
//! order; nothing is reordered or re-parsed.

use crate::element::Element;
use crate::error::Result;
use crate::parse::{decode_element, parse_value, Decoded};
use crate::schema::{self, ElementKind};

/// Streaming parser state: an accumulator and a read position.
///
/// The accumulator grows to at most the size of the largest top-level
/// element (for WebM input, a Cluster) plus one partial header.
#[derive(Debug, Default)]
pub struct StreamingParser {
    buf: Vec<u8>,
    pos: usize,
}

impl StreamingParser {
    /// A parser with an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an input chunk to the accumulator.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes currently buffered and not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Try to produce the next top-level element.
    ///
    /// Returns `Ok(None)` when the accumulator does not hold a complete
    /// element yet; push more input and poll again. The Segment header is
    /// consumed silently so its children stream out individually; unknown
    /// elements are skipped by their declared length with a warning.
    pub fn poll(&mut self) -> Result<Option<Element>> {
        loop {
            let window = &self.buf[self.pos..];
            if window.is_empty() {
                self.compact();
                return Ok(None);
            }

            match decode_element(window)? {
                Decoded::NeedMore => {
                    self.compact();
                    return Ok(None);
                }
                Decoded::SegmentStart { rest } => {
                    let consumed = window.len() - rest.len();
                    tracing::debug!("entering segment body");
                    self.pos += consumed;
                }
                Decoded::Element {
                    id,
                    kind,
                    payload,
                    rest,
                } => {
                    let consumed = window.len() - rest.len();

                    if kind == ElementKind::Unknown {
                        tracing::warn!(id, size = payload.len(), "skipping unknown element");
                        self.pos += consumed;
                        continue;
                    }

                    if !schema::is_segment_top_level(id) {
                        // Stray Void/CRC-32 between top-level elements
                        self.pos += consumed;
                        continue;
                    }

                    let value = parse_value(id, kind, payload)?;
                    self.pos += consumed;
                    self.compact();
                    return Ok(Some(Element { id, value }));
                }
            }
        }
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Value;
    use crate::schema::ids;
    use crate::vint::encode_vint;

    fn ebml_header() -> Vec<u8> {
        vec![
            0x1A, 0x45, 0xDF, 0xA3, 0x97, 0x42, 0x86, 0x81, 0x01, 0x42, 0xF7, 0x81, 0x01, 0x42,
            0xF2, 0x81, 0x04, 0x42, 0xF3, 0x81, 0x08, 0x42, 0x82, 0x84, 0x77, 0x65, 0x62, 0x6D,
        ]
    }

    fn element(id: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let id_bytes = id.to_be_bytes();
        let start = id_bytes.iter().position(|&b| b != 0).unwrap_or(3);
        out.extend_from_slice(&id_bytes[start..]);
        let (size, size_len) = encode_vint(payload.len() as u64).unwrap();
        out.extend_from_slice(&size[..size_len]);
        out.extend_from_slice(payload);
        out
    }

    fn sample_stream() -> Vec<u8> {
        // EBML header | Segment (unknown size) | Info | Cluster with one block
        let mut data = ebml_header();
        data.extend_from_slice(&[0x18, 0x53, 0x80, 0x67, 0xFF]);

        let mut info = element(ids::TIMECODE_SCALE, &[0x0F, 0x42, 0x40]);
        info.extend_from_slice(&element(ids::MUXING_APP, b"test"));
        data.extend_from_slice(&element(ids::INFO, &info));

        let mut cluster = element(ids::TIMECODE, &[0x00]);
        cluster.extend_from_slice(&element(
            ids::SIMPLE_BLOCK,
            &[0x81, 0x00, 0x00, 0x80, 0xAA],
        ));
        data.extend_from_slice(&element(ids::CLUSTER, &cluster));

        data
    }

    fn collect(parser: &mut StreamingParser) -> Vec<Element> {
        let mut out = Vec::new();
        while let Some(element) = parser.poll().unwrap() {
            out.push(element);
        }
        out
    }

    #[test]
    fn test_single_shot() {
        let mut parser = StreamingParser::new();
        parser.push(&sample_stream());

        let elements = collect(&mut parser);
        let names: Vec<_> = elements.iter().map(Element::name).collect();
        assert_eq!(names, ["EBML", "Info", "Cluster"]);

        // Segment was consumed without being materialized
        assert_eq!(parser.buffered(), 0);
    }

    #[test]
    fn test_one_byte_at_a_time_matches_single_shot() {
        let data = sample_stream();

        let mut single = StreamingParser::new();
        single.push(&data);
        let expected = collect(&mut single);

        let mut parser = StreamingParser::new();
        let mut got = Vec::new();
        let mut starved = 0;
        for &byte in &data {
            parser.push(&[byte]);
            match parser.poll().unwrap() {
                Some(element) => got.push(element),
                None => starved += 1,
            }
        }

        assert_eq!(got, expected);
        // NeedMoreBytes must have been observed along the way
        assert!(starved >= 2);
    }

    #[test]
    fn test_chunked_at_arbitrary_positions() {
        let data = sample_stream();

        let mut single = StreamingParser::new();
        single.push(&data);
        let expected = collect(&mut single);

        for split in [3, 11, 27, data.len() - 2] {
            let mut parser = StreamingParser::new();
            let mut got = Vec::new();
            parser.push(&data[..split]);
            got.extend(collect(&mut parser));
            parser.push(&data[split..]);
            got.extend(collect(&mut parser));
            assert_eq!(got, expected, "split at {split}");
        }
    }

    #[test]
    fn test_emits_one_element_per_poll() {
        let mut parser = StreamingParser::new();
        parser.push(&sample_stream());

        assert_eq!(parser.poll().unwrap().unwrap().id, ids::EBML);
        assert_eq!(parser.poll().unwrap().unwrap().id, ids::INFO);
        assert_eq!(parser.poll().unwrap().unwrap().id, ids::CLUSTER);
        assert_eq!(parser.poll().unwrap(), None);
    }

    #[test]
    fn test_unknown_top_level_skipped() {
        let mut data = ebml_header();
        // Unknown two-byte ID with a small payload, then a Void
        data.extend_from_slice(&element(0x4242, &[1, 2, 3]));
        data.extend_from_slice(&element(ids::VOID, &[0, 0]));

        let mut parser = StreamingParser::new();
        parser.push(&data);

        let elements = collect(&mut parser);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].id, ids::EBML);
    }

    #[test]
    fn test_cluster_block_payload_survives() {
        let mut parser = StreamingParser::new();
        parser.push(&sample_stream());

        let cluster = collect(&mut parser).pop().unwrap();
        let Some(Value::SimpleBlock(block)) = cluster.value.find(ids::SIMPLE_BLOCK) else {
            panic!("expected a SimpleBlock child");
        };
        assert_eq!(block.track_number, 1);
        assert!(block.is_keyframe());
        assert_eq!(block.payload, [0xAA]);
    }
}
