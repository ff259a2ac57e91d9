//! The `Ipns` facade: one identity, one configuration profile.

use std::time::Duration;

use ipns_record_core::{
    marshal_record, select, IdKeys, Record, RecordValue, RoutingKey, SignatureMode,
    MAX_RECORD_SIZE,
};

use crate::create::{create_record, create_record_with_expiration, CreateOptions};
use crate::error::Result;
use crate::signer::{Ed25519Verifier, RecordSigner, SignatureVerifier};
use crate::validator::Validator;

/// Configuration for record creation and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpnsConfig {
    /// TTL stamped on new records.
    pub default_ttl: Duration,
    /// Signatures produced for new records.
    pub signature_mode: SignatureMode,
    /// Largest marshalled record accepted.
    pub max_record_size: usize,
}

impl Default for IpnsConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(5 * 60),
            signature_mode: SignatureMode::V1Compatible,
            max_record_size: MAX_RECORD_SIZE,
        }
    }
}

impl IpnsConfig {
    /// Profile for names that change rarely: one hour TTL.
    pub fn long_ttl() -> Self {
        Self {
            default_ttl: Duration::from_secs(60 * 60),
            ..Self::default()
        }
    }

    /// Profile that drops the legacy V1 signature.
    pub fn v2_only() -> Self {
        Self {
            signature_mode: SignatureMode::V2Only,
            ..Self::default()
        }
    }
}

/// A marshalled record ready to hand to a routing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRecord {
    pub routing_key: RoutingKey,
    pub record: Record,
    pub bytes: Vec<u8>,
}

/// Creates, validates and selects records for a single identity.
pub struct Ipns<S: RecordSigner, V: SignatureVerifier = Ed25519Verifier> {
    signer: S,
    validator: Validator<V>,
    config: IpnsConfig,
}

impl<S: RecordSigner> Ipns<S, Ed25519Verifier> {
    /// Use the built-in Ed25519 verifier.
    pub fn new(signer: S, config: IpnsConfig) -> Self {
        Self::with_verifier(signer, Ed25519Verifier, config)
    }
}

impl<S: RecordSigner, V: SignatureVerifier> Ipns<S, V> {
    pub fn with_verifier(signer: S, verifier: V, config: IpnsConfig) -> Self {
        let validator = Validator::new(verifier).with_max_record_size(config.max_record_size);
        Self {
            signer,
            validator,
            config,
        }
    }

    pub fn config(&self) -> &IpnsConfig {
        &self.config
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keys
    // ─────────────────────────────────────────────────────────────────────────

    /// The routing key this identity publishes under.
    pub fn routing_key(&self) -> RoutingKey {
        RoutingKey::from_public_key(&self.signer.public_key())
    }

    /// The datastore key for this identity's records.
    pub fn local_key(&self) -> Result<String> {
        Ok(self.routing_key().local_key()?)
    }

    /// The DHT and datastore keys for this identity and its public key.
    pub fn id_keys(&self) -> Result<IdKeys> {
        Ok(self.routing_key().id_keys()?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a record valid for `lifetime` from now.
    pub async fn create(
        &self,
        value: impl Into<RecordValue>,
        sequence: u64,
        lifetime: Duration,
    ) -> Result<Record> {
        let options = CreateOptions::from_config(&self.config);
        create_record(&self.signer, &value.into(), sequence, lifetime, &options).await
    }

    /// Create a record valid until `expiration`.
    pub async fn create_with_expiration(
        &self,
        value: impl Into<RecordValue>,
        sequence: u64,
        expiration: &str,
    ) -> Result<Record> {
        let options = CreateOptions::from_config(&self.config);
        create_record_with_expiration(&self.signer, &value.into(), sequence, expiration, &options)
            .await
    }

    /// Create and marshal a record, paired with its routing key.
    pub async fn publish(
        &self,
        value: impl Into<RecordValue>,
        sequence: u64,
        lifetime: Duration,
    ) -> Result<PublishedRecord> {
        let record = self.create(value, sequence, lifetime).await?;
        let bytes = marshal_record(&record);
        let routing_key = self.routing_key();
        tracing::info!(
            routing_key = ?routing_key,
            sequence = record.sequence,
            size = bytes.len(),
            "publishing IPNS record"
        );
        Ok(PublishedRecord {
            routing_key,
            record,
            bytes,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation & Selection
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate a record found under any routing key.
    pub async fn validate(&self, routing_key: &[u8], marshalled: &[u8]) -> Result<Record> {
        Ok(self.validator.validate(routing_key, marshalled).await?)
    }

    /// Index of the best candidate. Does not check signatures or expiry.
    pub fn select<B: AsRef<[u8]>>(&self, routing_key: &[u8], candidates: &[B]) -> Option<usize> {
        select(routing_key, candidates)
    }

    /// Index of the best candidate among those that validate.
    pub async fn select_valid<B: AsRef<[u8]>>(
        &self,
        routing_key: &[u8],
        candidates: &[B],
    ) -> Option<usize> {
        let mut valid = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            if self
                .validator
                .validate(routing_key, candidate.as_ref())
                .await
                .is_ok()
            {
                valid.push((index, candidate.as_ref()));
            }
        }

        let bytes: Vec<&[u8]> = valid.iter().map(|(_, b)| *b).collect();
        let best = select(routing_key, &bytes)?;
        tracing::debug!(
            candidates = candidates.len(),
            valid = valid.len(),
            "selected IPNS record"
        );
        Some(valid[best].0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipns_record_core::Keypair;

    #[test]
    fn test_config_profiles() {
        assert_eq!(IpnsConfig::default().default_ttl, Duration::from_secs(300));
        assert_eq!(IpnsConfig::long_ttl().default_ttl, Duration::from_secs(3600));
        assert_eq!(IpnsConfig::default().max_record_size, 10 * 1024);
        assert_eq!(IpnsConfig::v2_only().signature_mode, SignatureMode::V2Only);
    }

    #[tokio::test]
    async fn test_publish_then_validate() {
        let ipns = Ipns::new(Keypair::from_seed(&[0x31; 32]), IpnsConfig::default());
        let published = ipns
            .publish(
                "/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu",
                2,
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        assert_eq!(published.routing_key, ipns.routing_key());
        let record = ipns
            .validate(published.routing_key.as_bytes(), &published.bytes)
            .await
            .unwrap();
        assert_eq!(record, published.record);
    }

    #[tokio::test]
    async fn test_long_ttl_profile() {
        let ipns = Ipns::new(Keypair::from_seed(&[0x31; 32]), IpnsConfig::long_ttl());
        let record = ipns.create("/a", 0, Duration::from_secs(60)).await.unwrap();
        assert_eq!(record.ttl, 3_600_000_000_000);
    }

    #[tokio::test]
    async fn test_local_key() {
        let ipns = Ipns::new(Keypair::from_seed(&[0x31; 32]), IpnsConfig::default());
        let local = ipns.local_key().unwrap();
        // identity multihash of a 36-byte key: 0x00 0x24 ...
        assert!(local.starts_with("/ipns/AASA"));
    }

    #[tokio::test]
    async fn test_id_keys() {
        let ipns = Ipns::new(Keypair::from_seed(&[0x31; 32]), IpnsConfig::default());
        let keys = ipns.id_keys().unwrap();
        assert_eq!(keys.routing_key, ipns.routing_key());
        assert!(keys.routing_pub_key.starts_with(b"/pk/"));
        assert_eq!(&keys.routing_pub_key[4..], &ipns.routing_key().as_bytes()[6..]);
        // "/ipns/" and "/pk/" in base32
        assert!(keys.ipns_key.starts_with("/F5UXA3TTF4"));
        assert!(keys.pk_key.starts_with("/F5YGWLY"));
    }
}
