//! Element decoding: header splitting and schema-directed payload typing.
//!
//! Both entry points are pure functions over byte slices. Running out of
//! input at the top level is reported as [`Decoded::NeedMore`]; inside a
//! fully-buffered master payload the same condition is structural corruption
//! and fails hard.

use crate::element::{
    Child, ChromaSiting, CodecId, FlagInterlaced, SimpleBlock, TrackType, Value,
};
use crate::error::{EbmlError, Result};
use crate::schema::{self, ids, ElementKind};
use crate::vint::read_vint;

/// Maximum recursion depth for nested master elements.
pub const MAX_RECURSION_DEPTH: u32 = 64;

/// Maximum payload a single element may declare (guards against OOM from
/// corrupt length fields).
pub const MAX_ELEMENT_SIZE: u64 = 256 * 1024 * 1024;

/// Outcome of decoding one element from the front of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// A complete element: header consumed, payload split off.
    Element {
        /// Raw element ID.
        id: u32,
        /// Schema kind.
        kind: ElementKind,
        /// The element payload.
        payload: &'a [u8],
        /// Bytes following the element.
        rest: &'a [u8],
    },
    /// The Segment header was consumed; its body is streamed through so
    /// clusters can be decoded one at a time instead of accumulating.
    SegmentStart {
        /// Bytes following the Segment header.
        rest: &'a [u8],
    },
    /// The buffer ends before the element does.
    NeedMore,
}

/// Decode one element header (and split off its payload) from `buf`.
///
/// The Segment element is never materialized: its header is consumed and
/// decoding proceeds directly into its children, which also covers the
/// unknown-size form streamed muxers write.
pub fn decode_element(buf: &[u8]) -> Result<Decoded<'_>> {
    let Some(id_vint) = read_vint(buf)? else {
        return Ok(Decoded::NeedMore);
    };
    if id_vint.length > 4 {
        return Err(EbmlError::Malformed(format!(
            "element ID of {} bytes exceeds the four-byte limit",
            id_vint.length
        )));
    }
    let id = id_vint.raw as u32;

    let after_id = &buf[id_vint.length..];
    let Some(size_vint) = read_vint(after_id)? else {
        return Ok(Decoded::NeedMore);
    };
    let rest = &after_id[size_vint.length..];

    if id == ids::SEGMENT {
        return Ok(Decoded::SegmentStart { rest });
    }

    if size_vint.is_unknown_size() {
        return Err(EbmlError::UnknownSize { id });
    }
    if size_vint.value > MAX_ELEMENT_SIZE {
        return Err(EbmlError::Oversized {
            id,
            size: size_vint.value,
        });
    }

    let len = size_vint.value as usize;
    if rest.len() < len {
        return Ok(Decoded::NeedMore);
    }

    let (payload, rest) = rest.split_at(len);
    Ok(Decoded::Element {
        id,
        kind: schema::element_kind(id),
        payload,
        rest,
    })
}

/// Parse an element payload into a typed [`Value`] per its schema kind.
pub fn parse_value(id: u32, kind: ElementKind, payload: &[u8]) -> Result<Value> {
    parse_value_at(id, kind, payload, 0)
}

fn parse_value_at(id: u32, kind: ElementKind, payload: &[u8], depth: u32) -> Result<Value> {
    // Structural and enumerated elements dispatch on ID before the kind.
    match id {
        ids::SIMPLE_BLOCK => return Ok(Value::SimpleBlock(SimpleBlock::parse(payload)?)),
        ids::CODEC_ID => {
            return Ok(Value::CodecId(CodecId::from(
                parse_ascii(payload).as_str(),
            )))
        }
        ids::TRACK_TYPE => return Ok(Value::TrackType(TrackType::from_raw(parse_uint(id, payload)?))),
        ids::FLAG_INTERLACED => {
            return Ok(Value::FlagInterlaced(FlagInterlaced::from_raw(parse_uint(
                id, payload,
            )?)))
        }
        ids::CHROMA_SITING_HORZ | ids::CHROMA_SITING_VERT => {
            return Ok(Value::ChromaSiting(ChromaSiting::from_raw(parse_uint(
                id, payload,
            )?)))
        }
        _ => {}
    }

    match kind {
        ElementKind::Master => parse_master(payload, depth),
        ElementKind::UInt => Ok(Value::UInt(parse_uint(id, payload)?)),
        ElementKind::Int => Ok(Value::Int(parse_int(id, payload)?)),
        ElementKind::Float => Ok(Value::Float(parse_float(id, payload)?)),
        ElementKind::Date => Ok(Value::Date(parse_int(id, payload)?)),
        ElementKind::String => Ok(Value::Ascii(parse_ascii(payload))),
        ElementKind::Utf8 => Ok(Value::Utf8(parse_utf8(id, payload)?)),
        ElementKind::Binary => Ok(Value::Binary(payload.to_vec())),
        ElementKind::Void => Ok(Value::Void(payload.len() as u64)),
        ElementKind::Crc32 => {
            let bytes: [u8; 4] = payload
                .try_into()
                .map_err(|_| EbmlError::Malformed("CRC-32 payload must be four bytes".into()))?;
            Ok(Value::Crc32(bytes))
        }
        ElementKind::Unknown => Ok(Value::Unknown(payload.to_vec())),
    }
}

fn parse_master(payload: &[u8], depth: u32) -> Result<Value> {
    if depth >= MAX_RECURSION_DEPTH {
        return Err(EbmlError::RecursionLimit { depth });
    }

    let mut children = Vec::new();
    let mut buf = payload;

    while !buf.is_empty() {
        match decode_element(buf)? {
            Decoded::Element {
                id,
                kind,
                payload,
                rest,
            } => {
                children.push(Child {
                    id,
                    value: parse_value_at(id, kind, payload, depth + 1)?,
                });
                buf = rest;
            }
            Decoded::NeedMore => {
                return Err(EbmlError::Malformed(
                    "truncated child inside a fully-buffered master element".into(),
                ))
            }
            Decoded::SegmentStart { .. } => {
                return Err(EbmlError::Malformed(
                    "Segment nested inside a master element".into(),
                ))
            }
        }
    }

    Ok(Value::Master(children))
}

fn parse_uint(id: u32, payload: &[u8]) -> Result<u64> {
    if payload.len() > 8 {
        return Err(EbmlError::Malformed(format!(
            "unsigned integer element {id:#010X} wider than eight bytes"
        )));
    }
    // Empty payloads default to zero
    let mut value = 0u64;
    for &byte in payload {
        value = (value << 8) | byte as u64;
    }
    Ok(value)
}

fn parse_int(id: u32, payload: &[u8]) -> Result<i64> {
    if payload.len() > 8 {
        return Err(EbmlError::Malformed(format!(
            "signed integer element {id:#010X} wider than eight bytes"
        )));
    }
    if payload.is_empty() {
        return Ok(0);
    }

    // Sign-extend from the first byte
    let mut value = if payload[0] & 0x80 != 0 { -1i64 } else { 0i64 };
    for &byte in payload {
        value = (value << 8) | byte as i64;
    }
    Ok(value)
}

fn parse_float(id: u32, payload: &[u8]) -> Result<f64> {
    match payload.len() {
        0 => Ok(0.0),
        4 => Ok(f32::from_be_bytes(payload.try_into().unwrap()) as f64),
        8 => Ok(f64::from_be_bytes(payload.try_into().unwrap())),
        n => Err(EbmlError::Malformed(format!(
            "float element {id:#010X} has invalid width {n}"
        ))),
    }
}

fn parse_ascii(payload: &[u8]) -> String {
    let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
    payload[..end].iter().map(|&b| b as char).collect()
}

fn parse_utf8(id: u32, payload: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(payload).map_err(|_| EbmlError::InvalidUtf8 { id })?;
    let end = text.find('\0').unwrap_or(text.len());
    Ok(text[..end].to_string())
}
