//! Type-Length-Value codec.
//!
//! Every value the engine writes to disk, scalar or structural, has the
//! shape `tag(1) | length(4, little-endian) | payload(length bytes)`. This
//! module is the single place that shape is encoded and decoded; every
//! higher layer (column schema, pages, the index, the WAL) builds its
//! on-disk framing out of [`encode_tlv`] / [`read_tlv`] and never touches
//! raw byte offsets itself.
//!
//! ## Scalar encodings
//!
//! - `int64` / `int32`: little-endian, fixed width (8 / 4 bytes).
//! - `byte`: a single byte.
//! - `bool`: a single byte, `0` or `1`.
//! - `string`: raw UTF-8 bytes, no terminator; `length` is the byte count.
//! - `null`: any scalar tag with a zero-length payload. A column's
//!   nullability is a schema property, not carried in the value itself, so
//!   an absent value still serializes under its column's declared tag.
//!
//! ## Container encodings
//!
//! - `list`: the outer payload is the concatenation of item TLVs.
//! - `map`: the outer payload is a sequence of `map-key TLV | map-value
//!   TLV` pairs. A map-key TLV always carries the `map-key` tag with the
//!   key's raw UTF-8 bytes as payload; a map-value TLV always carries the
//!   `map-value` tag, and its payload is itself a complete nested TLV (so
//!   the value's own tag survives inside it and callers can dispatch on
//!   it without extra context).

use byteforge_core::{tag, ColumnType, Error, Result, Value};
use bytes::{BufMut, BytesMut};
use std::io::Read;

/// Encodes a single TLV: tag byte, 4-byte little-endian length, payload.
pub fn encode_tlv(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(5 + payload.len());
    buf.put_u8(tag);
    buf.put_u32_le(payload.len() as u32);
    buf.put_slice(payload);
    buf.to_vec()
}

/// A decoded TLV header plus its payload slice, borrowed from the input.
pub struct Tlv<'a> {
    pub tag: u8,
    pub payload: &'a [u8],
}

/// Reads one TLV from the front of `bytes`, returning it and the number of
/// bytes consumed (5 + payload length).
///
/// Fails with [`Error::Truncated`] if fewer than 5 header bytes remain, or
/// fewer than `length` payload bytes remain.
pub fn read_tlv(bytes: &[u8]) -> Result<(Tlv<'_>, usize)> {
    if bytes.len() < 5 {
        return Err(Error::Truncated {
            expected: 5,
            found: bytes.len(),
        });
    }
    let tlv_tag = bytes[0];
    let len = u32::from_le_bytes(bytes[1..5].try_into().unwrap()) as usize;
    if bytes.len() < 5 + len {
        return Err(Error::Truncated {
            expected: 5 + len,
            found: bytes.len(),
        });
    }
    Ok((
        Tlv {
            tag: tlv_tag,
            payload: &bytes[5..5 + len],
        },
        5 + len,
    ))
}

/// Reads one TLV header (tag + length) from a sequential reader, without
/// reading the payload. Used by cursors that want to decide how to handle
/// the payload (skip it, decode it, etc.) before consuming it.
pub fn read_tlv_header<R: Read>(reader: &mut R) -> std::io::Result<(u8, u32)> {
    let mut header = [0u8; 5];
    reader.read_exact(&mut header)?;
    let tag = header[0];
    let len = u32::from_le_bytes(header[1..5].try_into().unwrap());
    Ok((tag, len))
}

/// Reads `len` payload bytes from a sequential reader.
pub fn read_payload<R: Read>(reader: &mut R, len: u32) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Encodes a scalar value under `ty`'s tag. A `Value::Null` encodes as a
/// zero-length payload; any other value must match `ty` or this panics —
/// callers always decide `ty` from the column being serialized, so a
/// mismatch is a programming error, not a runtime condition.
pub fn encode_value(ty: ColumnType, value: &Value) -> Vec<u8> {
    let payload: Vec<u8> = match value {
        Value::Null => Vec::new(),
        Value::Int64(v) => {
            assert_eq!(ty, ColumnType::Int64);
            v.to_le_bytes().to_vec()
        }
        Value::Int32(v) => {
            assert_eq!(ty, ColumnType::Int32);
            v.to_le_bytes().to_vec()
        }
        Value::Byte(v) => {
            assert_eq!(ty, ColumnType::Byte);
            vec![*v]
        }
        Value::Bool(v) => {
            assert_eq!(ty, ColumnType::Bool);
            vec![if *v { 1 } else { 0 }]
        }
        Value::String(v) => {
            assert_eq!(ty, ColumnType::String);
            v.as_bytes().to_vec()
        }
    };
    encode_tlv(ty.tag(), &payload)
}

/// Decodes a scalar payload whose tag is already known to be `ty`'s tag.
/// An empty payload decodes to `Value::Null`.
pub fn decode_value(ty: ColumnType, tag: u8, payload: &[u8]) -> Result<Value> {
    if tag != ty.tag() {
        return Err(Error::UnexpectedTag {
            found: tag,
            context: "scalar value",
        });
    }
    if payload.is_empty() {
        return Ok(Value::Null);
    }
    match ty {
        ColumnType::Int64 => {
            if payload.len() != 8 {
                return Err(Error::Truncated {
                    expected: 8,
                    found: payload.len(),
                });
            }
            Ok(Value::Int64(i64::from_le_bytes(payload.try_into().unwrap())))
        }
        ColumnType::Int32 => {
            if payload.len() != 4 {
                return Err(Error::Truncated {
                    expected: 4,
                    found: payload.len(),
                });
            }
            Ok(Value::Int32(i32::from_le_bytes(payload.try_into().unwrap())))
        }
        ColumnType::Byte => {
            if payload.len() != 1 {
                return Err(Error::Truncated {
                    expected: 1,
                    found: payload.len(),
                });
            }
            Ok(Value::Byte(payload[0]))
        }
        ColumnType::Bool => {
            if payload.len() != 1 {
                return Err(Error::Truncated {
                    expected: 1,
                    found: payload.len(),
                });
            }
            Ok(Value::Bool(payload[0] != 0))
        }
        ColumnType::String => {
            let s = std::str::from_utf8(payload)
                .map_err(|e| Error::RecordCorruption(format!("invalid utf-8 in string: {e}")))?;
            Ok(Value::String(s.to_string()))
        }
    }
}

/// Decodes a bare int64 TLV, used by the index and the last-commit
/// pointer where there is no surrounding column schema to consult.
pub fn decode_int64(tag: u8, payload: &[u8]) -> Result<i64> {
    match decode_value(ColumnType::Int64, tag, payload)? {
        Value::Int64(v) => Ok(v),
        Value::Null => Err(Error::Truncated {
            expected: 8,
            found: 0,
        }),
        _ => unreachable!(),
    }
}

pub fn encode_int64(v: i64) -> Vec<u8> {
    encode_value(ColumnType::Int64, &Value::Int64(v))
}

/// Wraps a sequence of already-encoded item TLVs as a `list`.
pub fn encode_list(items: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = items.iter().map(|i| i.len()).sum();
    let mut payload = Vec::with_capacity(total);
    for item in items {
        payload.extend_from_slice(item);
    }
    encode_tlv(tag::LIST, &payload)
}

/// Decodes a `list` TLV payload into its raw item TLVs (tag + payload
/// bytes), in encoded order. The caller applies its own per-item decoder.
pub fn decode_list_items(payload: &[u8]) -> Result<Vec<(u8, Vec<u8>)>> {
    let mut items = Vec::new();
    let mut offset = 0;
    while offset < payload.len() {
        let (tlv, consumed) = read_tlv(&payload[offset..])?;
        items.push((tlv.tag, tlv.payload.to_vec()));
        offset += consumed;
    }
    Ok(items)
}

/// Wraps string-keyed, already-encoded-value entries as a `map`.
pub fn encode_map(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut payload = Vec::new();
    for (key, value_tlv) in entries {
        payload.extend(encode_tlv(tag::MAP_KEY, key.as_bytes()));
        payload.extend(encode_tlv(tag::MAP_VALUE, value_tlv));
    }
    encode_tlv(tag::MAP, &payload)
}

/// Decodes a `map` TLV payload into `(key, nested-tag, nested-payload)`
/// triples. `iteration order is unspecified` per the format — callers
/// must not rely on it; this returns entries in encoded order.
pub fn decode_map_entries(payload: &[u8]) -> Result<Vec<(String, u8, Vec<u8>)>> {
    let mut entries = Vec::new();
    let mut offset = 0;
    while offset < payload.len() {
        let (key_tlv, consumed) = read_tlv(&payload[offset..])?;
        if key_tlv.tag != tag::MAP_KEY {
            return Err(Error::UnexpectedTag {
                found: key_tlv.tag,
                context: "map key",
            });
        }
        let key = std::str::from_utf8(key_tlv.payload)
            .map_err(|e| Error::RecordCorruption(format!("invalid utf-8 map key: {e}")))?
            .to_string();
        offset += consumed;

        let (value_tlv, consumed) = read_tlv(&payload[offset..])?;
        if value_tlv.tag != tag::MAP_VALUE {
            return Err(Error::UnexpectedTag {
                found: value_tlv.tag,
                context: "map value",
            });
        }
        // The map-value payload is itself a nested TLV; unwrap one level
        // so callers see the real value's tag.
        let (nested, _) = read_tlv(value_tlv.payload)?;
        entries.push((key, nested.tag, nested.payload.to_vec()));
        offset += consumed;
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trip_int64() {
        let v = Value::Int64(-123456789);
        let encoded = encode_value(ColumnType::Int64, &v);
        let (tlv, consumed) = read_tlv(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decode_value(ColumnType::Int64, tlv.tag, tlv.payload).unwrap(), v);
    }

    #[test]
    fn scalar_round_trip_int32() {
        let v = Value::Int32(-42);
        let encoded = encode_value(ColumnType::Int32, &v);
        let (tlv, _) = read_tlv(&encoded).unwrap();
        assert_eq!(decode_value(ColumnType::Int32, tlv.tag, tlv.payload).unwrap(), v);
    }

    #[test]
    fn scalar_round_trip_byte() {
        let v = Value::Byte(31);
        let encoded = encode_value(ColumnType::Byte, &v);
        let (tlv, _) = read_tlv(&encoded).unwrap();
        assert_eq!(decode_value(ColumnType::Byte, tlv.tag, tlv.payload).unwrap(), v);
    }

    #[test]
    fn scalar_round_trip_bool() {
        for v in [Value::Bool(true), Value::Bool(false)] {
            let encoded = encode_value(ColumnType::Bool, &v);
            let (tlv, _) = read_tlv(&encoded).unwrap();
            assert_eq!(decode_value(ColumnType::Bool, tlv.tag, tlv.payload).unwrap(), v);
        }
    }

    #[test]
    fn scalar_round_trip_string() {
        let v = Value::String("software engineer".to_string());
        let encoded = encode_value(ColumnType::String, &v);
        let (tlv, _) = read_tlv(&encoded).unwrap();
        assert_eq!(decode_value(ColumnType::String, tlv.tag, tlv.payload).unwrap(), v);
    }

    #[test]
    fn null_round_trips_as_empty_payload() {
        let encoded = encode_value(ColumnType::String, &Value::Null);
        let (tlv, _) = read_tlv(&encoded).unwrap();
        assert!(tlv.payload.is_empty());
        assert_eq!(decode_value(ColumnType::String, tlv.tag, tlv.payload).unwrap(), Value::Null);
    }

    #[test]
    fn truncated_input_is_reported() {
        let mut encoded = encode_value(ColumnType::Int64, &Value::Int64(7));
        encoded.truncate(6); // chop off most of the payload
        assert!(matches!(read_tlv(&encoded), Err(Error::Truncated { .. })));
    }

    #[test]
    fn list_round_trip() {
        let items: Vec<Vec<u8>> = vec![
            encode_value(ColumnType::Int64, &Value::Int64(1)),
            encode_value(ColumnType::Int64, &Value::Int64(2)),
            encode_value(ColumnType::Int64, &Value::Int64(3)),
        ];
        let encoded = encode_list(&items);
        let (tlv, _) = read_tlv(&encoded).unwrap();
        assert_eq!(tlv.tag, tag::LIST);
        let decoded = decode_list_items(tlv.payload).unwrap();
        assert_eq!(decoded.len(), 3);
        for (i, (t, payload)) in decoded.iter().enumerate() {
            assert_eq!(decode_value(ColumnType::Int64, *t, payload).unwrap(), Value::Int64(i as i64 + 1));
        }
    }

    #[test]
    fn map_round_trip() {
        let entries = vec![
            ("username".to_string(), encode_value(ColumnType::String, &Value::String("user1".into()))),
            ("age".to_string(), encode_value(ColumnType::Byte, &Value::Byte(31))),
        ];
        let encoded = encode_map(&entries);
        let (tlv, _) = read_tlv(&encoded).unwrap();
        assert_eq!(tlv.tag, tag::MAP);
        let decoded = decode_map_entries(tlv.payload).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].0, "username");
        assert_eq!(decode_value(ColumnType::String, decoded[0].1, &decoded[0].2).unwrap(), Value::String("user1".into()));
        assert_eq!(decoded[1].0, "age");
        assert_eq!(decode_value(ColumnType::Byte, decoded[1].1, &decoded[1].2).unwrap(), Value::Byte(31));
    }
}
