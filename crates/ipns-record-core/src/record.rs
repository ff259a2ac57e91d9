//! The IPNS record and its builder.
//!
//! The canonical CBOR payload in `data` is the source of truth; the other
//! fields are its decoded view plus the signatures over it. Fields are
//! public so records can be inspected and tampered with in tests, but
//! editing one after signing yields a record whose signatures no longer
//! match, and [`marshal_record`](crate::marshal_record) re-derives the
//! legacy envelope fields from `data` rather than from the decoded view.

use bytes::Bytes;
use ciborium::value::Value;
use serde::{Deserialize, Serialize};

use crate::canonical::{self, RecordPayload};
use crate::crypto::{Keypair, PublicKey};
use crate::error::CoreError;
use crate::normalize::{normalize_value, RecordValue};
use crate::types::{SignatureMode, ValidityType, DEFAULT_TTL_NS};
use crate::validity::parse_validity;

/// A signed, versioned pointer from a name to a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Normalized content path.
    pub value: String,
    pub validity_type: ValidityType,
    /// RFC 3339 expiry instant.
    pub validity: String,
    pub sequence: u64,
    /// Caching hint, in nanoseconds.
    pub ttl: u64,
    /// Protobuf-encoded public key, when the name does not inline it.
    pub pub_key: Option<Bytes>,
    /// Legacy signature, present only in V1-compatible records.
    pub signature_v1: Option<Bytes>,
    pub signature_v2: Bytes,
    /// Canonical CBOR payload.
    pub data: Bytes,
    /// Set when a decoded V1-compatible envelope left out `validityType`;
    /// re-marshalling leaves it out as well.
    #[serde(default)]
    pub omit_validity_type: bool,
}

impl Record {
    /// [`SignatureMode::V1Compatible`] when the record carries a legacy
    /// signature, [`SignatureMode::V2Only`] otherwise.
    pub fn mode(&self) -> SignatureMode {
        if self.signature_v1.is_some() {
            SignatureMode::V1Compatible
        } else {
            SignatureMode::V2Only
        }
    }

    /// Decode the canonical payload, including application-defined keys.
    pub fn payload(&self) -> Result<RecordPayload, CoreError> {
        canonical::decode_payload(&self.data)
    }

    /// The application-defined payload entries.
    pub fn extensible_data(&self) -> Result<Vec<(String, Value)>, CoreError> {
        Ok(self.payload()?.extra)
    }

    /// Parse the embedded public key, if the record carries one.
    pub fn embedded_public_key(&self) -> Result<Option<PublicKey>, CoreError> {
        self.pub_key
            .as_deref()
            .map(PublicKey::from_protobuf)
            .transpose()
    }

    /// The message `signature_v2` was made over.
    pub fn signature_v2_message(&self) -> Vec<u8> {
        canonical::signature_v2_message(&self.data)
    }
}

/// The protobuf key bytes to embed for `key`, or `None` when the key can be
/// recovered from its identity multihash.
pub fn embedded_key_bytes(key: &PublicKey) -> Option<Vec<u8>> {
    if key.to_multihash().is_identity() {
        None
    } else {
        Some(key.to_protobuf())
    }
}

/// Embed `key` in `record` unless it can be recovered from the name.
///
/// Returns whether the key was embedded. `pubKey` is not covered by either
/// signature, so this works on records that are already signed.
pub fn embed_public_key(record: &mut Record, key: &PublicKey) -> bool {
    match embedded_key_bytes(key) {
        Some(bytes) => {
            record.pub_key = Some(Bytes::from(bytes));
            true
        }
        None => false,
    }
}

/// Builder for new records.
///
/// Produces the messages to sign, then assembles the record from the
/// signatures in one of the two signature modes.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    value: String,
    validity: String,
    sequence: u64,
    ttl: u64,
    mode: SignatureMode,
    extra: Vec<(String, Value)>,
}

impl RecordBuilder {
    /// Start a record. The value is normalized and the validity must be a
    /// canonical RFC 3339 timestamp.
    pub fn new(
        value: &RecordValue,
        validity: impl Into<String>,
        sequence: u64,
    ) -> Result<Self, CoreError> {
        let validity = validity.into();
        parse_validity(&validity)?;

        Ok(Self {
            value: normalize_value(value)?,
            validity,
            sequence,
            ttl: DEFAULT_TTL_NS,
            mode: SignatureMode::default(),
            extra: Vec::new(),
        })
    }

    /// Set the TTL in nanoseconds.
    pub fn ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Choose whether to also produce the legacy V1 signature and fields.
    pub fn mode(mut self, mode: SignatureMode) -> Self {
        self.mode = mode;
        self
    }

    /// Add an application-defined payload entry.
    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.push((key.into(), value));
        self
    }

    /// Add several application-defined payload entries.
    pub fn extend_extra(mut self, entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.extra.extend(entries);
        self
    }

    /// The normalized value.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn signature_mode(&self) -> SignatureMode {
        self.mode
    }

    /// Encode the canonical payload.
    pub fn canonical_data(&self) -> Result<Vec<u8>, CoreError> {
        canonical::encode_payload(
            self.value.as_bytes(),
            self.validity.as_bytes(),
            ValidityType::Eol,
            self.sequence,
            self.ttl,
            &self.extra,
        )
    }

    /// The legacy V1 message: `value || validity || "EOL"`.
    pub fn signature_v1_message(&self) -> Vec<u8> {
        canonical::signature_v1_message(
            self.value.as_bytes(),
            self.validity.as_bytes(),
            ValidityType::Eol,
        )
    }

    /// Assemble a record carrying both signatures.
    pub fn build_v1_compatible(
        self,
        data: Vec<u8>,
        signature_v2: Vec<u8>,
        signature_v1: Vec<u8>,
        pub_key: Option<Vec<u8>>,
    ) -> Record {
        self.assemble(data, signature_v2, Some(signature_v1), pub_key)
    }

    /// Assemble a record carrying only the V2 signature.
    pub fn build_v2_only(
        self,
        data: Vec<u8>,
        signature_v2: Vec<u8>,
        pub_key: Option<Vec<u8>>,
    ) -> Record {
        self.assemble(data, signature_v2, None, pub_key)
    }

    /// Sign with a local Ed25519 keypair in the configured mode.
    pub fn sign(self, keypair: &Keypair) -> Result<Record, CoreError> {
        let data = self.canonical_data()?;
        let signature_v2 = keypair.sign(&canonical::signature_v2_message(&data)).to_vec();
        let pub_key = embedded_key_bytes(&keypair.public_key());

        Ok(match self.mode {
            SignatureMode::V1Compatible => {
                let signature_v1 = keypair.sign(&self.signature_v1_message()).to_vec();
                self.build_v1_compatible(data, signature_v2, signature_v1, pub_key)
            }
            SignatureMode::V2Only => self.build_v2_only(data, signature_v2, pub_key),
        })
    }

    fn assemble(
        self,
        data: Vec<u8>,
        signature_v2: Vec<u8>,
        signature_v1: Option<Vec<u8>>,
        pub_key: Option<Vec<u8>>,
    ) -> Record {
        Record {
            value: self.value,
            validity_type: ValidityType::Eol,
            validity: self.validity,
            sequence: self.sequence,
            ttl: self.ttl,
            pub_key: pub_key.map(Bytes::from),
            signature_v1: signature_v1.map(Bytes::from),
            signature_v2: Bytes::from(signature_v2),
            data: Bytes::from(data),
            omit_validity_type: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyType;

    const VALIDITY: &str = "2030-01-01T00:00:00.000000000Z";

    fn keypair() -> Keypair {
        Keypair::from_seed(&[0x42; 32])
    }

    #[test]
    fn test_sign_v1_compatible() {
        let record = RecordBuilder::new(&"/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu".into(), VALIDITY, 0)
            .unwrap()
            .sign(&keypair())
            .unwrap();

        assert_eq!(record.mode(), SignatureMode::V1Compatible);
        assert_eq!(record.ttl, DEFAULT_TTL_NS);
        assert!(record.pub_key.is_none());

        let key = keypair().public_key();
        assert!(key.verify(&record.signature_v2_message(), &record.signature_v2).is_ok());
        let v1 = [record.value.as_bytes(), VALIDITY.as_bytes(), b"EOL"].concat();
        assert!(key.verify(&v1, record.signature_v1.as_deref().unwrap()).is_ok());
    }

    #[test]
    fn test_sign_v2_only() {
        let record = RecordBuilder::new(&"/a".into(), VALIDITY, 7)
            .unwrap()
            .mode(SignatureMode::V2Only)
            .ttl(1)
            .sign(&keypair())
            .unwrap();

        assert_eq!(record.mode(), SignatureMode::V2Only);
        assert!(record.signature_v1.is_none());
        let payload = record.payload().unwrap();
        assert_eq!(payload.sequence, 7);
        assert_eq!(payload.ttl, 1);
        assert_eq!(payload.value, b"/a");
    }

    #[test]
    fn test_extensible_data() {
        let record = RecordBuilder::new(&"/a".into(), VALIDITY, 0)
            .unwrap()
            .extra("Custom", Value::Text("hello".into()))
            .sign(&keypair())
            .unwrap();

        let extra = record.extensible_data().unwrap();
        assert_eq!(extra, vec![("Custom".to_string(), Value::Text("hello".into()))]);
    }

    #[test]
    fn test_reserved_extra_key_rejected() {
        let result = RecordBuilder::new(&"/a".into(), VALIDITY, 0)
            .unwrap()
            .extra("Sequence", Value::Integer(9.into()))
            .sign(&keypair());
        assert!(matches!(result, Err(CoreError::InvalidRecordData(_))));
    }

    #[test]
    fn test_builder_rejects_bad_inputs() {
        assert!(matches!(
            RecordBuilder::new(&"nope".into(), VALIDITY, 0),
            Err(CoreError::InvalidValue(_))
        ));
        assert!(matches!(
            RecordBuilder::new(&"/a".into(), "2030-01-01", 0),
            Err(CoreError::UnrecognizedValidityFormat(_))
        ));
    }

    #[test]
    fn test_embed_rule() {
        assert!(embedded_key_bytes(&keypair().public_key()).is_none());
        let large = PublicKey::new(KeyType::Rsa, vec![1; 300]);
        assert_eq!(embedded_key_bytes(&large), Some(large.to_protobuf()));
    }

    #[test]
    fn test_embed_public_key() {
        let mut record = RecordBuilder::new(&"/a".into(), VALIDITY, 0)
            .unwrap()
            .sign(&keypair())
            .unwrap();

        assert!(!embed_public_key(&mut record, &keypair().public_key()));
        assert!(record.pub_key.is_none());

        let large = PublicKey::new(KeyType::Rsa, vec![7; 300]);
        assert!(embed_public_key(&mut record, &large));
        assert_eq!(record.embedded_public_key().unwrap(), Some(large));
        // pubKey is outside the signed payload
        assert!(keypair()
            .public_key()
            .verify(&record.signature_v2_message(), &record.signature_v2)
            .is_ok());
    }

    #[test]
    fn test_payload_wins_over_edited_fields() {
        let mut record = RecordBuilder::new(&"/a".into(), VALIDITY, 5)
            .unwrap()
            .sign(&keypair())
            .unwrap();
        record.sequence = 6;
        record.value = "/b".into();

        let decoded = crate::unmarshal_record(&crate::marshal_record(&record)).unwrap();
        assert_eq!(decoded.sequence, 5);
        assert_eq!(decoded.value, "/a");
    }

    #[test]
    fn test_embedded_public_key() {
        let mut record = RecordBuilder::new(&"/a".into(), VALIDITY, 0)
            .unwrap()
            .sign(&keypair())
            .unwrap();
        assert_eq!(record.embedded_public_key().unwrap(), None);

        record.pub_key = Some(Bytes::from(keypair().public_key().to_protobuf()));
        assert_eq!(record.embedded_public_key().unwrap(), Some(keypair().public_key()));

        record.pub_key = Some(Bytes::from_static(&[0xff]));
        assert!(record.embedded_public_key().is_err());
    }
}
