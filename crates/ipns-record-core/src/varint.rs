//! Unsigned LEB128 varints, shared by the multiformats and protobuf codecs.

use crate::error::CoreError;

/// Maximum encoded length of a `u64` varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Append `n` to `buf` as an unsigned varint.
pub fn encode(buf: &mut Vec<u8>, mut n: u64) {
    while n >= 0x80 {
        buf.push((n as u8) | 0x80);
        n >>= 7;
    }
    buf.push(n as u8);
}

/// Encode `n` into a fresh buffer.
pub fn to_vec(n: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_VARINT_LEN);
    encode(&mut buf, n);
    buf
}

/// Decode a varint from the front of `input`.
///
/// Returns the value and the remaining bytes.
pub fn decode(input: &[u8]) -> Result<(u64, &[u8]), CoreError> {
    let mut value: u64 = 0;
    for (i, &byte) in input.iter().enumerate().take(MAX_VARINT_LEN) {
        let low = u64::from(byte & 0x7f);
        // The tenth byte may only carry the single remaining bit.
        if i == MAX_VARINT_LEN - 1 && low > 1 {
            return Err(CoreError::DecodingError("varint overflows u64".into()));
        }
        value |= low << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, &input[i + 1..]));
        }
    }

    if input.len() >= MAX_VARINT_LEN {
        Err(CoreError::DecodingError("varint too long".into()))
    } else {
        Err(CoreError::DecodingError("truncated varint".into()))
    }
}
