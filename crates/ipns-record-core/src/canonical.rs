//! Canonical CBOR payload carried in the record's `data` field.
//!
//! The payload is a map with text keys, encoded with RFC 8949 Core
//! Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//!
//! With the five reserved keys this yields the order
//! `TTL, Value, Sequence, Validity, ValidityType`.

use ciborium::value::Value;

use crate::error::CoreError;
use crate::types::ValidityType;

/// Domain separation prefix for V2 signatures.
pub const SIGNATURE_V2_PREFIX: &[u8] = b"ipns-signature:";

/// Reserved payload keys.
pub mod keys {
    pub const VALUE: &str = "Value";
    pub const VALIDITY: &str = "Validity";
    pub const VALIDITY_TYPE: &str = "ValidityType";
    pub const SEQUENCE: &str = "Sequence";
    pub const TTL: &str = "TTL";

    pub const RESERVED: [&str; 5] = [VALUE, VALIDITY, VALIDITY_TYPE, SEQUENCE, TTL];
}

/// The decoded canonical payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPayload {
    pub value: Vec<u8>,
    pub validity: Vec<u8>,
    pub validity_type: ValidityType,
    pub sequence: u64,
    pub ttl: u64,
    /// Application-defined entries, in encoded order.
    pub extra: Vec<(String, Value)>,
}

/// Encode the payload map.
///
/// Extra keys may not shadow a reserved key.
pub fn encode_payload(
    value: &[u8],
    validity: &[u8],
    validity_type: ValidityType,
    sequence: u64,
    ttl: u64,
    extra: &[(String, Value)],
) -> Result<Vec<u8>, CoreError> {
    let mut entries = Vec::with_capacity(5 + extra.len());
    entries.push((Value::Text(keys::VALUE.into()), Value::Bytes(value.to_vec())));
    entries.push((Value::Text(keys::VALIDITY.into()), Value::Bytes(validity.to_vec())));
    entries.push((
        Value::Text(keys::VALIDITY_TYPE.into()),
        Value::Integer(validity_type.to_u64().into()),
    ));
    entries.push((Value::Text(keys::SEQUENCE.into()), Value::Integer(sequence.into())));
    entries.push((Value::Text(keys::TTL.into()), Value::Integer(ttl.into())));

    for (key, value) in extra {
        if keys::RESERVED.contains(&key.as_str()) {
            return Err(CoreError::InvalidRecordData(format!(
                "extensible data may not override reserved key {key:?}"
            )));
        }
        if extra.iter().filter(|(k, _)| k == key).count() > 1 {
            return Err(CoreError::InvalidRecordData(format!(
                "duplicate extensible data key {key:?}"
            )));
        }
        entries.push((Value::Text(key.clone()), value.clone()));
    }

    let mut buf = Vec::new();
    encode_map_canonical(&mut buf, &entries)?;
    Ok(buf)
}

/// Decode and check the payload map.
pub fn decode_payload(bytes: &[u8]) -> Result<RecordPayload, CoreError> {
    let mut reader = bytes;
    let value: Value =
        ciborium::from_reader(&mut reader).map_err(|e| CoreError::DecodingError(e.to_string()))?;
    if !reader.is_empty() {
        return Err(CoreError::InvalidRecordData(format!(
            "{} trailing bytes after payload",
            reader.len()
        )));
    }

    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::InvalidRecordData("payload is not a map".into())),
    };

    let get = |key: &str| -> Option<&Value> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Text(t) if t == key))
            .map(|(_, v)| v)
    };

    let value = match get(keys::VALUE) {
        Some(Value::Bytes(b)) => b.clone(),
        _ => return Err(CoreError::InvalidRecordData("missing or invalid Value".into())),
    };

    let validity = match get(keys::VALIDITY) {
        Some(Value::Bytes(b)) => b.clone(),
        _ => return Err(CoreError::InvalidRecordData("missing or invalid Validity".into())),
    };

    let validity_type = match get(keys::VALIDITY_TYPE) {
        Some(Value::Integer(i)) => {
            let n: i128 = (*i).into();
            u64::try_from(n)
                .ok()
                .and_then(ValidityType::from_u64)
                .ok_or_else(|| CoreError::UnsupportedValidity(n.to_string()))?
        }
        _ => {
            return Err(CoreError::InvalidRecordData(
                "missing or invalid ValidityType".into(),
            ))
        }
    };

    let sequence = read_u64(get(keys::SEQUENCE), keys::SEQUENCE)?;
    let ttl = read_u64(get(keys::TTL), keys::TTL)?;

    let mut extra = Vec::new();
    for (k, v) in &map {
        match k {
            Value::Text(t) if keys::RESERVED.contains(&t.as_str()) => {}
            Value::Text(t) => extra.push((t.clone(), v.clone())),
            _ => {
                return Err(CoreError::InvalidRecordData(
                    "payload keys must be text".into(),
                ))
            }
        }
    }

    Ok(RecordPayload {
        value,
        validity,
        validity_type,
        sequence,
        ttl,
        extra,
    })
}

fn read_u64(value: Option<&Value>, name: &str) -> Result<u64, CoreError> {
    match value {
        Some(Value::Integer(i)) => {
            let n: i128 = (*i).into();
            u64::try_from(n)
                .map_err(|_| CoreError::InvalidRecordData(format!("{name} out of range: {n}")))
        }
        _ => Err(CoreError::InvalidRecordData(format!("missing or invalid {name}"))),
    }
}

/// The message signed by a V2 signature.
pub fn signature_v2_message(data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SIGNATURE_V2_PREFIX.len() + data.len());
    buf.extend_from_slice(SIGNATURE_V2_PREFIX);
    buf.extend_from_slice(data);
    buf
}

/// The message signed by a legacy V1 signature: `value || validity || "EOL"`.
pub fn signature_v1_message(value: &[u8], validity: &[u8], validity_type: ValidityType) -> Vec<u8> {
    let suffix = validity_type.as_str().as_bytes();
    let mut buf = Vec::with_capacity(value.len() + validity.len() + suffix.len());
    buf.extend_from_slice(value);
    buf.extend_from_slice(validity);
    buf.extend_from_slice(suffix);
    buf
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr)?,
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(f) => encode_float(buf, *f),
        Value::Tag(tag, inner) => {
            encode_uint(buf, 6, *tag);
            encode_value_to(buf, inner)?;
        }
        _ => {
            return Err(CoreError::InvalidRecordData(
                "unsupported CBOR value in extensible data".into(),
            ))
        }
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) -> Result<(), CoreError> {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item)?;
    }
    Ok(())
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    let mut key_value_pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        key_value_pairs.push((key_buf, v));
    }

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

/// Shortest of half, single and double precision that holds `f` exactly.
fn encode_float(buf: &mut Vec<u8>, f: f64) {
    if f.is_nan() {
        buf.extend_from_slice(&[0xf9, 0x7e, 0x00]);
        return;
    }
    let single = f as f32;
    if f64::from(single) != f {
        buf.push(0xfb);
        buf.extend_from_slice(&f.to_be_bytes());
    } else if let Some(half) = f32_to_f16_exact(single) {
        buf.push(0xf9);
        buf.extend_from_slice(&half.to_be_bytes());
    } else {
        buf.push(0xfa);
        buf.extend_from_slice(&single.to_be_bytes());
    }
}

/// IEEE 754 binary16 bits for `f`, if the conversion loses nothing.
fn f32_to_f16_exact(f: f32) -> Option<u16> {
    let bits = f.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exponent = ((bits >> 23) & 0xff) as i32;
    let mantissa = bits & 0x7f_ffff;

    if exponent == 0xff {
        // infinities; NaN is handled by the caller
        return Some(sign | 0x7c00);
    }
    if exponent == 0 {
        // zero, or an f32 subnormal far below the f16 range
        return (mantissa == 0).then_some(sign);
    }

    let e = exponent - 127;
    if (-14..=15).contains(&e) {
        if mantissa & 0x1fff != 0 {
            return None;
        }
        return Some(sign | (((e + 15) as u16) << 10) | (mantissa >> 13) as u16);
    }
    if (-24..-14).contains(&e) {
        let significand = mantissa | 0x80_0000;
        let shift = -(e + 1) as u32;
        if significand & ((1 << shift) - 1) != 0 {
            return None;
        }
        return Some(sign | (significand >> shift) as u16);
    }
    None
}
