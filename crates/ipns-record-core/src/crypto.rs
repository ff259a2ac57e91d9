//! Public keys in their libp2p protobuf form, and the Ed25519 keypair
//! records are signed with.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cid::{codec, Cid};
use crate::error::CoreError;
use crate::multihash::Multihash;
use crate::protobuf::{self, FieldReader, FieldValue};
use crate::types::RoutingKey;

/// Protobuf-encoded keys up to this size are inlined into an identity multihash.
pub const MAX_INLINE_KEY_LENGTH: usize = 42;

/// libp2p key algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    Rsa,
    Ed25519,
    Secp256k1,
    Ecdsa,
}

impl KeyType {
    pub fn to_u64(self) -> u64 {
        match self {
            KeyType::Rsa => 0,
            KeyType::Ed25519 => 1,
            KeyType::Secp256k1 => 2,
            KeyType::Ecdsa => 3,
        }
    }

    pub fn from_u64(v: u64) -> Option<Self> {
        match v {
            0 => Some(KeyType::Rsa),
            1 => Some(KeyType::Ed25519),
            2 => Some(KeyType::Secp256k1),
            3 => Some(KeyType::Ecdsa),
            _ => None,
        }
    }
}

/// A public key of any libp2p key type.
///
/// `data` is the type-specific key encoding (raw 32 bytes for Ed25519,
/// DER for RSA).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    key_type: KeyType,
    data: Vec<u8>,
}

impl PublicKey {
    pub fn new(key_type: KeyType, data: impl Into<Vec<u8>>) -> Self {
        Self {
            key_type,
            data: data.into(),
        }
    }

    pub fn ed25519(bytes: [u8; 32]) -> Self {
        Self::new(KeyType::Ed25519, bytes.to_vec())
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encode as the libp2p `PublicKey` protobuf message.
    pub fn to_protobuf(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.data.len() + 4);
        protobuf::write_varint_field(&mut buf, 1, self.key_type.to_u64());
        protobuf::write_bytes_field(&mut buf, 2, &self.data);
        buf
    }

    /// Decode the libp2p `PublicKey` protobuf message. Both fields are required.
    pub fn from_protobuf(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut key_type = None;
        let mut data = None;

        for field in FieldReader::new(bytes) {
            let (number, value) = field.map_err(|e| CoreError::InvalidPublicKey(e.to_string()))?;
            match (number, value) {
                (1, FieldValue::Varint(v)) => {
                    key_type = Some(KeyType::from_u64(v).ok_or_else(|| {
                        CoreError::UnsupportedKeyType(format!("unknown key type {v}"))
                    })?);
                }
                (2, FieldValue::Bytes(b)) => data = Some(b.to_vec()),
                (1 | 2, _) => {
                    return Err(CoreError::InvalidPublicKey(format!(
                        "field {number} has the wrong wire type"
                    )))
                }
                _ => {}
            }
        }

        let key_type =
            key_type.ok_or_else(|| CoreError::InvalidPublicKey("missing key type".into()))?;
        let data = data.ok_or_else(|| CoreError::InvalidPublicKey("missing key data".into()))?;
        if key_type == KeyType::Ed25519 && data.len() != 32 {
            return Err(CoreError::InvalidPublicKey(format!(
                "ed25519 key must be 32 bytes, got {}",
                data.len()
            )));
        }
        Ok(Self { key_type, data })
    }

    /// The peer identity multihash: identity when the protobuf form is small
    /// enough to inline, SHA2-256 otherwise.
    pub fn to_multihash(&self) -> Multihash {
        let encoded = self.to_protobuf();
        if encoded.len() <= MAX_INLINE_KEY_LENGTH {
            Multihash::identity(&encoded)
        } else {
            Multihash::sha2_256(&encoded)
        }
    }

    pub fn to_routing_key(&self) -> RoutingKey {
        RoutingKey::from_public_key(self)
    }

    /// CIDv1 with the libp2p-key codec.
    pub fn to_cid(&self) -> Cid {
        Cid::new_v1(codec::LIBP2P_KEY, self.to_multihash())
    }

    /// Verify `signature` over `message`. Only Ed25519 is supported here;
    /// other key types need an external verifier.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CoreError> {
        match self.key_type {
            KeyType::Ed25519 => {
                let bytes: [u8; 32] = self
                    .data
                    .as_slice()
                    .try_into()
                    .map_err(|_| CoreError::InvalidPublicKey("ed25519 key must be 32 bytes".into()))?;
                let verifying_key = VerifyingKey::from_bytes(&bytes)
                    .map_err(|e| CoreError::InvalidPublicKey(e.to_string()))?;
                let sig = Signature::from_slice(signature).map_err(|_| CoreError::InvalidSignature)?;
                verifying_key
                    .verify(message, &sig)
                    .map_err(|_| CoreError::InvalidSignature)
            }
            other => Err(CoreError::UnsupportedKeyType(format!(
                "no built-in verifier for {other:?}"
            ))),
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = hex::encode(&self.data);
        write!(f, "PublicKey({:?}, {})", self.key_type, &hex[..hex.len().min(16)])
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl Ed25519Signature {
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Sig({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Ed25519Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An Ed25519 keypair for signing records.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: SigningKey::generate(&mut csprng),
        }
    }

    /// Create from a 32-byte seed (deterministic).
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::ed25519(self.signing_key.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Ed25519Signature {
        Ed25519Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multihash;

    #[test]
    fn test_ed25519_protobuf_layout() {
        let key = Keypair::from_seed(&[0x42; 32]).public_key();
        let encoded = key.to_protobuf();
        assert_eq!(encoded.len(), 36);
        assert_eq!(&encoded[..4], &[0x08, 0x01, 0x12, 0x20]);
        assert_eq!(PublicKey::from_protobuf(&encoded).unwrap(), key);
    }

    #[test]
    fn test_small_key_uses_identity_multihash() {
        let key = Keypair::from_seed(&[1; 32]).public_key();
        let mh = key.to_multihash();
        assert!(mh.is_identity());
        assert_eq!(mh.digest(), key.to_protobuf().as_slice());
        assert_eq!(
            key.to_routing_key().inline_public_key().unwrap(),
            Some(key.clone())
        );
    }

    #[test]
    fn test_large_key_uses_sha256_multihash() {
        let key = PublicKey::new(KeyType::Rsa, vec![0xab; 270]);
        let mh = key.to_multihash();
        assert_eq!(mh.code(), multihash::SHA2_256);
        assert_eq!(mh.digest().len(), 32);
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = Keypair::from_seed(&[7; 32]);
        let sig = keypair.sign(b"message");
        let key = keypair.public_key();
        assert!(key.verify(b"message", sig.as_ref()).is_ok());
        assert!(matches!(
            key.verify(b"other", sig.as_ref()),
            Err(CoreError::InvalidSignature)
        ));
        assert!(matches!(
            key.verify(b"message", &[0u8; 10]),
            Err(CoreError::InvalidSignature)
        ));
    }

    #[test]
    fn test_unsupported_key_type_verify() {
        let key = PublicKey::new(KeyType::Secp256k1, vec![2; 33]);
        assert!(matches!(
            key.verify(b"m", &[0; 64]),
            Err(CoreError::UnsupportedKeyType(_))
        ));
    }

    #[test]
    fn test_from_protobuf_errors() {
        assert!(PublicKey::from_protobuf(&[]).is_err());
        // type only
        assert!(PublicKey::from_protobuf(&[0x08, 0x01]).is_err());
        // unknown type
        assert!(matches!(
            PublicKey::from_protobuf(&[0x08, 0x09, 0x12, 0x00]),
            Err(CoreError::UnsupportedKeyType(_))
        ));
        // ed25519 with the wrong length
        assert!(PublicKey::from_protobuf(&[0x08, 0x01, 0x12, 0x01, 0xff]).is_err());
    }

    #[test]
    fn test_deterministic_keypair() {
        let kp1 = Keypair::from_seed(&[0x42; 32]);
        let kp2 = Keypair::from_seed(&[0x42; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.sign(b"x"), kp2.sign(b"x"));
    }
}
