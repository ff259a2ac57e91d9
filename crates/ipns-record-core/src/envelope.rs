//! The protobuf envelope (`IpnsEntry`) that wraps every record on the wire.
//!
//! ```text
//! 1 value        bytes
//! 2 signatureV1  bytes
//! 3 validityType enum
//! 4 validity     bytes
//! 5 sequence     uint64
//! 6 ttl          uint64
//! 7 pubKey       bytes
//! 8 signatureV2  bytes
//! 9 data         bytes
//! ```

use crate::error::CoreError;
use crate::protobuf::{self, FieldReader, FieldValue};

mod fields {
    pub const VALUE: u32 = 1;
    pub const SIGNATURE_V1: u32 = 2;
    pub const VALIDITY_TYPE: u32 = 3;
    pub const VALIDITY: u32 = 4;
    pub const SEQUENCE: u32 = 5;
    pub const TTL: u32 = 6;
    pub const PUB_KEY: u32 = 7;
    pub const SIGNATURE_V2: u32 = 8;
    pub const DATA: u32 = 9;
}

/// Raw envelope fields, all optional at this layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpnsEntry {
    pub value: Option<Vec<u8>>,
    pub signature_v1: Option<Vec<u8>>,
    pub validity_type: Option<u64>,
    pub validity: Option<Vec<u8>>,
    pub sequence: Option<u64>,
    pub ttl: Option<u64>,
    pub pub_key: Option<Vec<u8>>,
    pub signature_v2: Option<Vec<u8>>,
    pub data: Option<Vec<u8>>,
}

impl IpnsEntry {
    /// Encode present fields in field-number order.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if let Some(v) = &self.value {
            protobuf::write_bytes_field(&mut buf, fields::VALUE, v);
        }
        if let Some(v) = &self.signature_v1 {
            protobuf::write_bytes_field(&mut buf, fields::SIGNATURE_V1, v);
        }
        if let Some(v) = self.validity_type {
            protobuf::write_varint_field(&mut buf, fields::VALIDITY_TYPE, v);
        }
        if let Some(v) = &self.validity {
            protobuf::write_bytes_field(&mut buf, fields::VALIDITY, v);
        }
        if let Some(v) = self.sequence {
            protobuf::write_varint_field(&mut buf, fields::SEQUENCE, v);
        }
        if let Some(v) = self.ttl {
            protobuf::write_varint_field(&mut buf, fields::TTL, v);
        }
        if let Some(v) = &self.pub_key {
            protobuf::write_bytes_field(&mut buf, fields::PUB_KEY, v);
        }
        if let Some(v) = &self.signature_v2 {
            protobuf::write_bytes_field(&mut buf, fields::SIGNATURE_V2, v);
        }
        if let Some(v) = &self.data {
            protobuf::write_bytes_field(&mut buf, fields::DATA, v);
        }
        buf
    }

    /// Decode an envelope. Unknown fields are skipped; for repeated known
    /// fields the last occurrence wins.
    pub fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut entry = IpnsEntry::default();

        for field in FieldReader::new(bytes) {
            let (number, value) = field?;
            match (number, value) {
                (fields::VALUE, FieldValue::Bytes(b)) => entry.value = Some(b.to_vec()),
                (fields::SIGNATURE_V1, FieldValue::Bytes(b)) => {
                    entry.signature_v1 = Some(b.to_vec())
                }
                (fields::VALIDITY_TYPE, FieldValue::Varint(n)) => entry.validity_type = Some(n),
                (fields::VALIDITY, FieldValue::Bytes(b)) => entry.validity = Some(b.to_vec()),
                (fields::SEQUENCE, FieldValue::Varint(n)) => entry.sequence = Some(n),
                (fields::TTL, FieldValue::Varint(n)) => entry.ttl = Some(n),
                (fields::PUB_KEY, FieldValue::Bytes(b)) => entry.pub_key = Some(b.to_vec()),
                (fields::SIGNATURE_V2, FieldValue::Bytes(b)) => {
                    entry.signature_v2 = Some(b.to_vec())
                }
                (fields::DATA, FieldValue::Bytes(b)) => entry.data = Some(b.to_vec()),
                (fields::VALUE..=fields::DATA, _) => {
                    return Err(CoreError::DecodingError(format!(
                        "envelope field {number} has the wrong wire type"
                    )))
                }
                _ => {}
            }
        }

        Ok(entry)
    }
}
