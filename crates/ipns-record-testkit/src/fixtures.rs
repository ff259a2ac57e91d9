//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use ipns_record::{
    Ed25519Verifier, Ipns, IpnsConfig, RecordSigner, SignError, SignatureVerifier,
};
use ipns_record_core::validity::expiration_from_lifetime;
use ipns_record_core::{
    format_validity, marshal_record, CoreError, KeyType, Keypair, PublicKey, Record,
    RecordBuilder, RecordValue, RoutingKey,
};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Size of the key material behind a [`LargeKeySigner`], close to a DER
/// encoded RSA-2048 public key.
pub const LARGE_KEY_LENGTH: usize = 270;

/// A test fixture with a keypair and a configuration profile.
pub struct TestFixture {
    pub keypair: Keypair,
    pub config: IpnsConfig,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new() -> Self {
        Self {
            keypair: Keypair::generate(),
            config: IpnsConfig::default(),
        }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(&seed),
            config: IpnsConfig::default(),
        }
    }

    pub fn with_config(mut self, config: IpnsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    pub fn routing_key(&self) -> RoutingKey {
        RoutingKey::from_public_key(&self.keypair.public_key())
    }

    /// An `Ipns` facade over a copy of this fixture's keypair.
    pub fn ipns(&self) -> Ipns<Keypair> {
        Ipns::new(self.keypair.clone(), self.config.clone())
    }

    /// A record valid for one hour from now.
    pub fn make_record(
        &self,
        value: impl Into<RecordValue>,
        sequence: u64,
    ) -> Result<Record, CoreError> {
        let expiry = expiration_from_lifetime(Utc::now(), Duration::from_secs(3600))?;
        self.make_record_with_validity(value, sequence, &format_validity(expiry))
    }

    /// A record with an explicit canonical validity.
    pub fn make_record_with_validity(
        &self,
        value: impl Into<RecordValue>,
        sequence: u64,
        validity: &str,
    ) -> Result<Record, CoreError> {
        let ttl = u64::try_from(self.config.default_ttl.as_nanos()).unwrap_or(u64::MAX);
        RecordBuilder::new(&value.into(), validity, sequence)?
            .ttl(ttl)
            .mode(self.config.signature_mode)
            .sign(&self.keypair)
    }

    /// A record that expired at the turn of the millennium.
    pub fn make_expired(
        &self,
        value: impl Into<RecordValue>,
        sequence: u64,
    ) -> Result<Record, CoreError> {
        self.make_record_with_validity(value, sequence, "2000-01-01T00:00:00.000000000Z")
    }

    /// [`make_record`](Self::make_record), marshalled.
    pub fn make_marshalled(
        &self,
        value: impl Into<RecordValue>,
        sequence: u64,
    ) -> Result<Vec<u8>, CoreError> {
        Ok(marshal_record(&self.make_record(value, sequence)?))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[..8].copy_from_slice(&(i as u64).to_le_bytes());
            TestFixture::with_seed(seed)
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Signers and verifiers
// ─────────────────────────────────────────────────────────────────────────────

/// A stand-in for an RSA identity.
///
/// The key is too large to inline, so its routing key holds a SHA2-256
/// multihash and records must embed the key. Signatures are
/// `sha256(key || message)`: they bind the message to the key but prove
/// nothing, and are only accepted by [`FixtureVerifier`].
#[derive(Debug, Clone)]
pub struct LargeKeySigner {
    key: PublicKey,
}

impl LargeKeySigner {
    pub fn generate() -> Self {
        let mut data = vec![0u8; LARGE_KEY_LENGTH];
        rand::thread_rng().fill_bytes(&mut data);
        Self::from_key_data(data)
    }

    /// Deterministic key material expanded from `seed`.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let mut data = Vec::with_capacity(LARGE_KEY_LENGTH);
        let mut counter = 0u32;
        while data.len() < LARGE_KEY_LENGTH {
            let block = Sha256::new()
                .chain_update(seed)
                .chain_update(counter.to_be_bytes())
                .finalize();
            data.extend_from_slice(&block);
            counter += 1;
        }
        data.truncate(LARGE_KEY_LENGTH);
        Self::from_key_data(data)
    }

    fn from_key_data(data: Vec<u8>) -> Self {
        Self {
            key: PublicKey::new(KeyType::Rsa, data),
        }
    }

    pub fn routing_key(&self) -> RoutingKey {
        RoutingKey::from_public_key(&self.key)
    }
}

fn large_key_signature(key: &PublicKey, message: &[u8]) -> Vec<u8> {
    Sha256::new()
        .chain_update(key.data())
        .chain_update(message)
        .finalize()
        .to_vec()
}

#[async_trait]
impl RecordSigner for LargeKeySigner {
    fn public_key(&self) -> PublicKey {
        self.key.clone()
    }

    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignError> {
        Ok(large_key_signature(&self.key, message))
    }
}

/// Accepts [`LargeKeySigner`] signatures for RSA keys and defers to
/// [`Ed25519Verifier`] for everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureVerifier;

#[async_trait]
impl SignatureVerifier for FixtureVerifier {
    async fn verify(
        &self,
        key: &PublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, CoreError> {
        match key.key_type() {
            KeyType::Rsa => Ok(large_key_signature(key, message) == signature),
            _ => Ed25519Verifier.verify(key, message, signature).await,
        }
    }
}

/// Knows a public key but holds no private key.
#[derive(Debug, Clone)]
pub struct PublicOnlySigner(pub PublicKey);

#[async_trait]
impl RecordSigner for PublicOnlySigner {
    fn public_key(&self) -> PublicKey {
        self.0.clone()
    }

    async fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, SignError> {
        Err(SignError::MissingKeyMaterial)
    }
}

/// A signer whose backend always fails with the given message.
#[derive(Debug, Clone)]
pub struct FailingSigner {
    pub key: PublicKey,
    pub reason: String,
}

#[async_trait]
impl RecordSigner for FailingSigner {
    fn public_key(&self) -> PublicKey {
        self.key.clone()
    }

    async fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, SignError> {
        Err(SignError::Failed(self.reason.clone()))
    }
}
