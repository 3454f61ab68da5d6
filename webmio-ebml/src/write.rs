//! Serialization of typed elements back to EBML bytes.
//!
//! Elements are encoded compute-then-emit: the payload is built first, then
//! prefixed with the element ID and a minimal-width length VINT. Integers
//! and floats use their minimal widths, so byte-exact re-serialization holds
//! for input that was itself minimally encoded (which includes everything
//! this serializer produces).

use crate::element::Value;
use crate::error::Result;
use crate::vint::encode_vint;

/// Append an element (ID, length, payload) to `out`.
pub fn encode_element(id: u32, value: &Value, out: &mut Vec<u8>) -> Result<()> {
    let mut payload = Vec::new();
    encode_payload(value, &mut payload)?;

    write_element_id(out, id);
    let (size, size_len) = encode_vint(payload.len() as u64)?;
    out.extend_from_slice(&size[..size_len]);
    out.extend_from_slice(&payload);
    Ok(())
}

/// Append an element's payload bytes without its header.
pub fn encode_payload(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Master(children) => {
            for child in children {
                encode_element(child.id, &child.value, out)?;
            }
        }
        Value::UInt(v) => write_uint(out, *v),
        Value::Int(v) => write_int(out, *v),
        Value::Float(v) => write_float(out, *v),
        Value::Ascii(s) => out.extend(s.chars().map(|c| c as u8)),
        Value::Utf8(s) => out.extend_from_slice(s.as_bytes()),
        Value::Date(ns) => out.extend_from_slice(&ns.to_be_bytes()),
        Value::Binary(bytes) | Value::Unknown(bytes) => out.extend_from_slice(bytes),
        Value::Void(size) => out.resize(out.len() + *size as usize, 0),
        Value::Crc32(bytes) => out.extend_from_slice(bytes),
        Value::SimpleBlock(block) => block.write(out)?,
        Value::TrackType(t) => write_uint(out, t.to_raw()),
        Value::FlagInterlaced(f) => write_uint(out, f.to_raw()),
        Value::ChromaSiting(c) => write_uint(out, c.to_raw()),
        Value::CodecId(c) => out.extend_from_slice(c.as_str().as_bytes()),
    }
    Ok(())
}

/// Append a raw element ID (big-endian, leading zero bytes stripped).
pub fn write_element_id(out: &mut Vec<u8>, id: u32) {
    let bytes = id.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(3);
    out.extend_from_slice(&bytes[start..]);
}

/// Append an unsigned integer in its minimal width (zero is one byte).
pub fn write_uint(out: &mut Vec<u8>, value: u64) {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
    out.extend_from_slice(&bytes[start..]);
}

/// Append a signed integer in its minimal width, keeping the byte that
/// carries the sign.
pub fn write_int(out: &mut Vec<u8>, value: i64) {
    let bytes = value.to_be_bytes();
    let fill: u8 = if value < 0 { 0xFF } else { 0x00 };

    let mut start = 0;
    while start < 7 && bytes[start] == fill && (bytes[start + 1] & 0x80) == (fill & 0x80) {
        start += 1;
    }
    out.extend_from_slice(&bytes[start..]);
}

/// Append a float, four bytes when exactly representable as `f32`.
pub fn write_float(out: &mut Vec<u8>, value: f64) {
    let narrowed = value as f32;
    if f64::from(narrowed) == value {
        out.extend_from_slice(&narrowed.to_be_bytes());
    } else {
        out.extend_from_slice(&value.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Child, SimpleBlock};
    use crate::parse::{decode_element, parse_value, Decoded};
    use crate::schema::ids;

    fn reparse(bytes: &[u8]) -> (u32, Value) {
        let Decoded::Element {
            id, kind, payload, ..
        } = decode_element(bytes).unwrap()
        else {
            panic!("expected a complete element");
        };
        (id, parse_value(id, kind, payload).unwrap())
    }

    #[test]
    fn test_write_element_id() {
        let mut out = Vec::new();
        write_element_id(&mut out, ids::EBML);
        assert_eq!(out, [0x1A, 0x45, 0xDF, 0xA3]);

        out.clear();
        write_element_id(&mut out, ids::TIMECODE);
        assert_eq!(out, [0xE7]);
    }

    #[test]
    fn test_write_uint_minimal() {
        for (value, expected) in [
            (0u64, vec![0x00]),
            (1, vec![0x01]),
            (255, vec![0xFF]),
            (256, vec![0x01, 0x00]),
            (1_000_000, vec![0x0F, 0x42, 0x40]),
        ] {
            let mut out = Vec::new();
            write_uint(&mut out, value);
            assert_eq!(out, expected, "value {value}");
        }
    }

    #[test]
    fn test_write_int_keeps_sign_byte() {
        for (value, expected) in [
            (0i64, vec![0x00]),
            (1, vec![0x01]),
            (-1, vec![0xFF]),
            (127, vec![0x7F]),
            (128, vec![0x00, 0x80]),
            (-128, vec![0x80]),
            (-129, vec![0xFF, 0x7F]),
        ] {
            let mut out = Vec::new();
            write_int(&mut out, value);
            assert_eq!(out, expected, "value {value}");
        }
    }

    #[test]
    fn test_write_float_widths() {
        let mut out = Vec::new();
        write_float(&mut out, 2.5);
        assert_eq!(out.len(), 4);

        out.clear();
        write_float(&mut out, 0.1);
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn test_value_roundtrip() {
        let values = [
            Value::UInt(48_000),
            Value::Int(-12_345),
            Value::Float(2.5),
            Value::Ascii("und".to_string()),
            Value::Utf8("título".to_string()),
            Value::Date(788_918_400_000_000_000),
            Value::Binary(vec![0xDE, 0xAD]),
        ];
        let element_ids = [
            ids::CHANNELS,
            ids::REFERENCE_BLOCK,
            ids::DURATION,
            ids::LANGUAGE,
            ids::TITLE,
            ids::DATE_UTC,
            ids::CODEC_PRIVATE,
        ];

        for (id, value) in element_ids.into_iter().zip(values) {
            let mut bytes = Vec::new();
            encode_element(id, &value, &mut bytes).unwrap();
            let (got_id, got) = reparse(&bytes);
            assert_eq!(got_id, id);
            assert_eq!(got, value);
        }
    }

    #[test]
    fn test_master_roundtrip_preserves_child_order() {
        let value = Value::Master(vec![
            Child {
                id: ids::TIMECODE,
                value: Value::UInt(100),
            },
            Child {
                id: ids::SIMPLE_BLOCK,
                value: Value::SimpleBlock(SimpleBlock::new(1, 0, true, vec![0xAB])),
            },
            Child {
                id: ids::SIMPLE_BLOCK,
                value: Value::SimpleBlock(SimpleBlock::new(2, 20, false, vec![0xCD])),
            },
        ]);

        let mut bytes = Vec::new();
        encode_element(ids::CLUSTER, &value, &mut bytes).unwrap();

        let (id, got) = reparse(&bytes);
        assert_eq!(id, ids::CLUSTER);
        assert_eq!(got, value);
    }

    #[test]
    fn test_minimally_encoded_bytes_reserialize_exactly() {
        // serialize(parse(B)) == B for input this serializer could have written
        let mut info = Vec::new();
        encode_element(ids::TIMECODE_SCALE, &Value::UInt(1_000_000), &mut info).unwrap();
        encode_element(ids::MUXING_APP, &Value::Utf8("webmio".into()), &mut info).unwrap();

        let mut bytes = Vec::new();
        write_element_id(&mut bytes, ids::INFO);
        let (size, size_len) = encode_vint(info.len() as u64).unwrap();
        bytes.extend_from_slice(&size[..size_len]);
        bytes.extend_from_slice(&info);

        let (id, value) = reparse(&bytes);
        let mut again = Vec::new();
        encode_element(id, &value, &mut again).unwrap();
        assert_eq!(again, bytes);
    }

    #[test]
    fn test_void_writes_zeros() {
        let mut bytes = Vec::new();
        encode_element(ids::VOID, &Value::Void(5), &mut bytes).unwrap();
        assert_eq!(bytes, [0xEC, 0x85, 0, 0, 0, 0, 0]);
    }
}
