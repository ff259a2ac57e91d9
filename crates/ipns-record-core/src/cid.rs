//! Content identifiers (CIDv0 and CIDv1).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::multibase::{self, Base};
use crate::multihash::{self, Multihash};
use crate::varint;

/// Content codecs that appear in IPNS values.
pub mod codec {
    pub const RAW: u64 = 0x55;
    pub const DAG_PB: u64 = 0x70;
    pub const DAG_CBOR: u64 = 0x71;
    pub const LIBP2P_KEY: u64 = 0x72;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CidVersion {
    V0,
    V1,
}

/// A content identifier.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cid {
    version: CidVersion,
    codec: u64,
    hash: Multihash,
}

impl Cid {
    /// A CIDv1 with the given codec.
    pub fn new_v1(codec: u64, hash: Multihash) -> Self {
        Self {
            version: CidVersion::V1,
            codec,
            hash,
        }
    }

    /// A CIDv0. Only dag-pb over SHA2-256 can be expressed as v0.
    pub fn new_v0(hash: Multihash) -> Result<Self, CoreError> {
        if hash.code() != multihash::SHA2_256 || hash.digest().len() != 32 {
            return Err(CoreError::InvalidCid(
                "CIDv0 requires a 32-byte sha2-256 multihash".into(),
            ));
        }
        Ok(Self {
            version: CidVersion::V0,
            codec: codec::DAG_PB,
            hash,
        })
    }

    /// CIDv0 or CIDv1.
    pub fn version(&self) -> CidVersion {
        self.version
    }

    /// Multicodec of the content, `dag-pb` for every CIDv0.
    pub fn codec(&self) -> u64 {
        self.codec
    }

    /// Multihash of the content.
    pub fn hash(&self) -> &Multihash {
        &self.hash
    }

    /// Parse the binary form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() == 34 && bytes[0] == 0x12 && bytes[1] == 0x20 {
            let hash = Multihash::from_bytes(bytes)?;
            return Self::new_v0(hash);
        }

        let (version, rest) =
            varint::decode(bytes).map_err(|e| CoreError::InvalidCid(e.to_string()))?;
        if version != 1 {
            return Err(CoreError::InvalidCid(format!("unsupported CID version {version}")));
        }
        let (codec, rest) =
            varint::decode(rest).map_err(|e| CoreError::InvalidCid(e.to_string()))?;
        let hash = Multihash::from_bytes(rest).map_err(|e| CoreError::InvalidCid(e.to_string()))?;
        Ok(Self::new_v1(codec, hash))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self.version {
            CidVersion::V0 => self.hash.to_bytes(),
            CidVersion::V1 => {
                let mut buf = Vec::new();
                varint::encode(&mut buf, 1);
                varint::encode(&mut buf, self.codec);
                buf.extend_from_slice(&self.hash.to_bytes());
                buf
            }
        }
    }

    /// Parse the string form: a bare base58btc CIDv0, or any supported multibase.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.len() == 46 && s.starts_with("Qm") {
            let bytes = Base::Base58Btc
                .decode(s)
                .map_err(|e| CoreError::InvalidCid(e.to_string()))?;
            return Self::from_bytes(&bytes);
        }

        let (_, bytes) = multibase::decode(s).map_err(|e| CoreError::InvalidCid(e.to_string()))?;
        let cid = Self::from_bytes(&bytes)?;
        if cid.version == CidVersion::V0 {
            return Err(CoreError::InvalidCid(
                "CIDv0 must be encoded as bare base58btc".into(),
            ));
        }
        Ok(cid)
    }

    /// Upgrade to CIDv1. A v1 CID is returned unchanged.
    pub fn to_v1(&self) -> Self {
        Self::new_v1(self.codec, self.hash.clone())
    }

    /// `k`-prefixed base36 of the v1 form.
    pub fn to_base36(&self) -> String {
        multibase::encode(Base::Base36Lower, &self.to_v1().to_bytes())
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            CidVersion::V0 => f.write_str(&Base::Base58Btc.encode(&self.to_bytes())),
            CidVersion::V1 => f.write_str(&multibase::encode(Base::Base32Lower, &self.to_bytes())),
        }
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({self})")
    }
}

impl FromStr for Cid {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
