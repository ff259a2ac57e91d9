//! Minimal protobuf wire helpers for the two fixed message shapes we speak:
//! the record envelope and the libp2p public key.

use crate::error::CoreError;
use crate::varint;

pub(crate) const WIRE_VARINT: u8 = 0;
pub(crate) const WIRE_FIXED64: u8 = 1;
pub(crate) const WIRE_LEN: u8 = 2;
pub(crate) const WIRE_FIXED32: u8 = 5;

/// A single decoded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldValue<'a> {
    Varint(u64),
    Bytes(&'a [u8]),
    /// A fixed-width field we have no use for.
    Fixed,
}

pub(crate) fn write_varint_field(buf: &mut Vec<u8>, field: u32, value: u64) {
    varint::encode(buf, u64::from(field) << 3 | u64::from(WIRE_VARINT));
    varint::encode(buf, value);
}

pub(crate) fn write_bytes_field(buf: &mut Vec<u8>, field: u32, value: &[u8]) {
    varint::encode(buf, u64::from(field) << 3 | u64::from(WIRE_LEN));
    varint::encode(buf, value.len() as u64);
    buf.extend_from_slice(value);
}

/// Iterates over `(field number, value)` pairs.
pub(crate) struct FieldReader<'a> {
    input: &'a [u8],
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Self {
        Self { input }
    }

    fn next_field(&mut self) -> Result<(u32, FieldValue<'a>), CoreError> {
        let (key, rest) = varint::decode(self.input)?;
        let field = u32::try_from(key >> 3)
            .map_err(|_| CoreError::DecodingError("field number out of range".into()))?;
        if field == 0 {
            return Err(CoreError::DecodingError("field number 0 is reserved".into()));
        }

        let (value, rest) = match (key & 0x07) as u8 {
            WIRE_VARINT => {
                let (n, rest) = varint::decode(rest)?;
                (FieldValue::Varint(n), rest)
            }
            WIRE_FIXED64 => (FieldValue::Fixed, take(rest, 8)?.1),
            WIRE_LEN => {
                let (len, rest) = varint::decode(rest)?;
                let len = usize::try_from(len)
                    .map_err(|_| CoreError::DecodingError("length overflows".into()))?;
                let (bytes, rest) = take(rest, len)?;
                (FieldValue::Bytes(bytes), rest)
            }
            WIRE_FIXED32 => (FieldValue::Fixed, take(rest, 4)?.1),
            other => {
                return Err(CoreError::DecodingError(format!(
                    "unsupported wire type {other} for field {field}"
                )))
            }
        };

        self.input = rest;
        Ok((field, value))
    }
}

impl<'a> Iterator for FieldReader<'a> {
    type Item = Result<(u32, FieldValue<'a>), CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.input.is_empty() {
            return None;
        }
        let item = self.next_field();
        if item.is_err() {
            // Stop after the first error.
            self.input = &[];
        }
        Some(item)
    }
}

fn take(input: &[u8], len: usize) -> Result<(&[u8], &[u8]), CoreError> {
    if input.len() < len {
        return Err(CoreError::DecodingError(format!(
            "truncated field: need {len} bytes, have {}",
            input.len()
        )));
    }
    Ok(input.split_at(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read() {
        let mut buf = Vec::new();
        write_varint_field(&mut buf, 1, 150);
        write_bytes_field(&mut buf, 2, b"abc");
        assert_eq!(buf, vec![0x08, 0x96, 0x01, 0x12, 0x03, b'a', b'b', b'c']);

        let fields: Vec<_> = FieldReader::new(&buf).collect::<Result<_, _>>().unwrap();
        assert_eq!(
            fields,
            vec![(1, FieldValue::Varint(150)), (2, FieldValue::Bytes(b"abc"))]
        );
    }

    #[test]
    fn test_skips_fixed_width() {
        let buf = [0x09, 1, 2, 3, 4, 5, 6, 7, 8, 0x15, 1, 2, 3, 4];
        let fields: Vec<_> = FieldReader::new(&buf).collect::<Result<_, _>>().unwrap();
        assert_eq!(fields, vec![(1, FieldValue::Fixed), (2, FieldValue::Fixed)]);
    }

    #[test]
    fn test_rejects_groups_and_truncation() {
        // wire type 3 (start group)
        assert!(FieldReader::new(&[0x0b]).next().unwrap().is_err());
        // length 5, only 2 bytes
        assert!(FieldReader::new(&[0x12, 0x05, 1, 2]).next().unwrap().is_err());
        // field 0
        assert!(FieldReader::new(&[0x00, 0x00]).next().unwrap().is_err());
    }
}
