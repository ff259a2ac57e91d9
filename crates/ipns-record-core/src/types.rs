//! Core identifier and enum types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::PublicKey;
use crate::error::CoreError;
use crate::multibase::Base;
use crate::multihash::{self, Multihash};

/// Prefix shared by routing keys and local datastore keys.
pub const IPNS_PREFIX: &str = "/ipns/";

/// Prefix of the DHT key a public key is published under.
pub const PK_PREFIX: &str = "/pk/";

/// Default record TTL: 5 minutes, in nanoseconds.
pub const DEFAULT_TTL_NS: u64 = 5 * 60 * 1_000_000_000;

/// TTL of the long-lived profile: 1 hour, in nanoseconds.
pub const LONG_TTL_NS: u64 = 60 * 60 * 1_000_000_000;

/// Largest marshalled record accepted by validation.
pub const MAX_RECORD_SIZE: usize = 10 * 1024;

/// How a record's validity field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidityType {
    /// Valid until an absolute point in time.
    Eol,
}

impl ValidityType {
    pub fn to_u64(self) -> u64 {
        match self {
            ValidityType::Eol => 0,
        }
    }

    pub fn from_u64(v: u64) -> Option<Self> {
        match v {
            0 => Some(ValidityType::Eol),
            _ => None,
        }
    }

    /// The name used in V1 signatures.
    pub fn as_str(self) -> &'static str {
        match self {
            ValidityType::Eol => "EOL",
        }
    }
}

/// Which signatures a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignatureMode {
    /// V2 signature plus the legacy V1 signature and envelope fields.
    #[default]
    V1Compatible,
    /// V2 signature and canonical payload only.
    V2Only,
}

/// The DHT key a record is published under: `/ipns/` followed by the
/// multihash bytes of the publisher's public key.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingKey(Vec<u8>);

impl RoutingKey {
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self::from_multihash(&key.to_multihash())
    }

    pub fn from_multihash(mh: &Multihash) -> Self {
        let mut bytes = IPNS_PREFIX.as_bytes().to_vec();
        bytes.extend_from_slice(&mh.to_bytes());
        Self(bytes)
    }

    /// Parse raw routing key bytes.
    ///
    /// The multihash must be identity or SHA2-256.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let key = Self(bytes.to_vec());
        key.multihash()?;
        Ok(key)
    }

    /// The public key multihash this routing key names.
    pub fn multihash(&self) -> Result<Multihash, CoreError> {
        let rest = self
            .0
            .strip_prefix(IPNS_PREFIX.as_bytes())
            .ok_or_else(|| CoreError::InvalidRoutingKey("missing /ipns/ prefix".into()))?;
        let mh = Multihash::from_bytes(rest)
            .map_err(|e| CoreError::InvalidRoutingKey(e.to_string()))?;
        match mh.code() {
            multihash::IDENTITY | multihash::SHA2_256 => Ok(mh),
            other => Err(CoreError::InvalidRoutingKey(format!(
                "unsupported multihash code 0x{other:x}"
            ))),
        }
    }

    /// The public key inlined in an identity multihash, if there is one.
    pub fn inline_public_key(&self) -> Result<Option<PublicKey>, CoreError> {
        let mh = self.multihash()?;
        if !mh.is_identity() {
            return Ok(None);
        }
        PublicKey::from_protobuf(mh.digest()).map(Some)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The datastore key: `/ipns/` + unpadded upper-case base32 of the multihash.
    pub fn local_key(&self) -> Result<String, CoreError> {
        let mh = self.multihash()?;
        Ok(format!("{IPNS_PREFIX}{}", Base::Base32Upper.encode(&mh.to_bytes())))
    }

    /// `/pk/` + the multihash: where the public key itself is published.
    pub fn public_key_key(&self) -> Result<Vec<u8>, CoreError> {
        let mut bytes = PK_PREFIX.as_bytes().to_vec();
        bytes.extend_from_slice(&self.multihash()?.to_bytes());
        Ok(bytes)
    }

    /// Every key this identity is stored under, in the DHT and locally.
    pub fn id_keys(&self) -> Result<IdKeys, CoreError> {
        let routing_pub_key = self.public_key_key()?;
        Ok(IdKeys {
            pk_key: datastore_key(&routing_pub_key),
            ipns_key: datastore_key(&self.0),
            routing_pub_key,
            routing_key: self.clone(),
        })
    }
}

/// The DHT keys of an identity and their datastore forms.
///
/// A datastore form is `/` followed by the whole DHT key, prefix included,
/// in unpadded upper-case base32.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdKeys {
    /// `/pk/` + multihash.
    pub routing_pub_key: Vec<u8>,
    pub pk_key: String,
    /// `/ipns/` + multihash.
    pub routing_key: RoutingKey,
    pub ipns_key: String,
}

fn datastore_key(dht_key: &[u8]) -> String {
    format!("/{}", Base::Base32Upper.encode(dht_key))
}

impl AsRef<[u8]> for RoutingKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.multihash() {
            Ok(mh) => write!(f, "RoutingKey(/ipns/{})", mh.to_base58btc()),
            Err(_) => write!(f, "RoutingKey({})", hex::encode(&self.0)),
        }
    }
}

impl TryFrom<&[u8]> for RoutingKey {
    type Error = CoreError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}
