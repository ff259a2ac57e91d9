//! Self-describing hashes: `varint(code) || varint(len) || digest`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::CoreError;
use crate::varint;

/// The identity "hash": the digest is the input itself.
pub const IDENTITY: u64 = 0x00;

/// SHA2-256.
pub const SHA2_256: u64 = 0x12;

/// A decoded multihash.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Multihash {
    code: u64,
    digest: Vec<u8>,
}

impl Multihash {
    /// Wrap an arbitrary digest under `code`.
    pub fn wrap(code: u64, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            code,
            digest: digest.into(),
        }
    }

    /// An identity multihash over `data`.
    pub fn identity(data: &[u8]) -> Self {
        Self::wrap(IDENTITY, data)
    }

    /// A SHA2-256 multihash over `data`.
    pub fn sha2_256(data: &[u8]) -> Self {
        Self::wrap(SHA2_256, Sha256::digest(data).to_vec())
    }

    pub fn code(&self) -> u64 {
        self.code
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    pub fn is_identity(&self) -> bool {
        self.code == IDENTITY
    }

    /// Parse a multihash that must span all of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let (mh, rest) = Self::read(bytes)?;
        if !rest.is_empty() {
            return Err(CoreError::InvalidMultihash(format!(
                "{} trailing bytes",
                rest.len()
            )));
        }
        Ok(mh)
    }

    /// Parse a multihash from the front of `bytes`, returning the remainder.
    pub fn read(bytes: &[u8]) -> Result<(Self, &[u8]), CoreError> {
        let (code, rest) =
            varint::decode(bytes).map_err(|e| CoreError::InvalidMultihash(e.to_string()))?;
        let (len, rest) =
            varint::decode(rest).map_err(|e| CoreError::InvalidMultihash(e.to_string()))?;
        let len = usize::try_from(len)
            .map_err(|_| CoreError::InvalidMultihash("digest length overflows".into()))?;
        if rest.len() < len {
            return Err(CoreError::InvalidMultihash(format!(
                "digest truncated: expected {len} bytes, found {}",
                rest.len()
            )));
        }
        let (digest, rest) = rest.split_at(len);
        Ok((Self::wrap(code, digest), rest))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.digest.len() + 4);
        varint::encode(&mut buf, self.code);
        varint::encode(&mut buf, self.digest.len() as u64);
        buf.extend_from_slice(&self.digest);
        buf
    }

    /// Parse a base58btc peer-id string (`12D3Koo...`, `16Uiu2...`, `Qm...`).
    pub fn from_base58btc(s: &str) -> Result<Self, CoreError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CoreError::InvalidMultihash(format!("base58btc: {e}")))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_base58btc(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }
}

impl fmt::Debug for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multihash(0x{:02x}, {})", self.code, hex::encode(&self.digest))
    }
}
