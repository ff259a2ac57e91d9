//! Canonicalize the things a record may point at into one path form.

use std::fmt;

use crate::cid::{codec, Cid};
use crate::crypto::PublicKey;
use crate::error::CoreError;
use crate::multihash::Multihash;

/// Anything that can be published as a record value.
#[derive(Clone, PartialEq, Eq)]
pub enum RecordValue {
    /// Content, published as `/ipfs/<cidv1>` (or `/ipns/` for libp2p keys).
    Cid(Cid),
    /// Another name, identified by its public key.
    PublicKey(PublicKey),
    /// Another name, identified by its peer multihash.
    Multihash(Multihash),
    /// A UTF-8 path or a binary CID.
    Bytes(Vec<u8>),
    /// A path or a CID string.
    Text(String),
}

impl fmt::Debug for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Cid(c) => write!(f, "Cid({c})"),
            RecordValue::PublicKey(k) => write!(f, "{k:?}"),
            RecordValue::Multihash(mh) => write!(f, "{mh:?}"),
            RecordValue::Bytes(b) => write!(f, "Bytes({})", hex::encode(b)),
            RecordValue::Text(s) => write!(f, "Text({s:?})"),
        }
    }
}

impl From<Cid> for RecordValue {
    fn from(cid: Cid) -> Self {
        RecordValue::Cid(cid)
    }
}

impl From<PublicKey> for RecordValue {
    fn from(key: PublicKey) -> Self {
        RecordValue::PublicKey(key)
    }
}

impl From<Multihash> for RecordValue {
    fn from(mh: Multihash) -> Self {
        RecordValue::Multihash(mh)
    }
}

impl From<Vec<u8>> for RecordValue {
    fn from(bytes: Vec<u8>) -> Self {
        RecordValue::Bytes(bytes)
    }
}

impl From<&[u8]> for RecordValue {
    fn from(bytes: &[u8]) -> Self {
        RecordValue::Bytes(bytes.to_vec())
    }
}

impl From<String> for RecordValue {
    fn from(s: String) -> Self {
        RecordValue::Text(s)
    }
}

impl From<&str> for RecordValue {
    fn from(s: &str) -> Self {
        RecordValue::Text(s.to_string())
    }
}

/// Normalize a value for signing and storage.
pub fn normalize_value(value: &RecordValue) -> Result<String, CoreError> {
    match value {
        RecordValue::PublicKey(key) => Ok(ipns_path(&key.to_cid())),
        RecordValue::Multihash(mh) => Ok(ipns_path(&Cid::new_v1(codec::LIBP2P_KEY, mh.clone()))),
        RecordValue::Cid(cid) => Ok(cid_path(cid)),
        RecordValue::Text(s) => normalize_text(s),
        RecordValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(s) if s.trim().starts_with('/') => normalize_text(s),
            _ => Cid::from_bytes(bytes)
                .map(|cid| cid_path(&cid))
                .map_err(|_| CoreError::InvalidValue(hex::encode(bytes))),
        },
    }
}

/// Normalize the `Value` bytes of a decoded payload.
///
/// Paths pass through. Binary CIDs always render as `/ipfs/<cidv1>`.
pub fn normalize_byte_value(bytes: &[u8]) -> Result<String, CoreError> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        let trimmed = s.trim();
        if trimmed.starts_with('/') && trimmed.len() > 1 {
            return Ok(trimmed.to_string());
        }
    }

    Cid::from_bytes(bytes)
        .map(|cid| format!("/ipfs/{}", cid.to_v1()))
        .map_err(|_| CoreError::InvalidValue(String::from_utf8_lossy(bytes).into_owned()))
}

fn normalize_text(s: &str) -> Result<String, CoreError> {
    let trimmed = s.trim();
    if trimmed.starts_with('/') && trimmed.len() > 1 {
        return Ok(trimmed.to_string());
    }

    Cid::parse(trimmed)
        .map(|cid| cid_path(&cid))
        .map_err(|_| CoreError::InvalidValue(s.to_string()))
}

fn cid_path(cid: &Cid) -> String {
    if cid.codec() == codec::LIBP2P_KEY {
        ipns_path(cid)
    } else {
        format!("/ipfs/{}", cid.to_v1())
    }
}

fn ipns_path(cid: &Cid) -> String {
    format!("/ipns/{}", cid.to_base36())
}
