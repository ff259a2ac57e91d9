//! Record validation.
//!
//! Checks run cheapest first: the size ceiling and decoding happen before
//! any signature work.

use chrono::{DateTime, Utc};
use ipns_record_core::validation::{
    check_record_size, check_validity_at, resolve_public_key, valid_for_at,
};
use ipns_record_core::{
    unmarshal_record, PublicKey, Record, RoutingKey, ValidationError, MAX_RECORD_SIZE,
};

use crate::signer::{Ed25519Verifier, SignatureVerifier};

type Result<T> = std::result::Result<T, ValidationError>;

/// Validates marshalled records against the routing key they were found under.
#[derive(Debug, Clone)]
pub struct Validator<V = Ed25519Verifier> {
    verifier: V,
    max_record_size: usize,
}

impl Default for Validator<Ed25519Verifier> {
    fn default() -> Self {
        Self::new(Ed25519Verifier)
    }
}

impl<V: SignatureVerifier> Validator<V> {
    /// A validator that checks signatures with `verifier` and accepts records
    /// up to [`MAX_RECORD_SIZE`](ipns_record_core::MAX_RECORD_SIZE) bytes.
    pub fn new(verifier: V) -> Self {
        Self {
            verifier,
            max_record_size: MAX_RECORD_SIZE,
        }
    }

    /// Override the size ceiling (10 KiB by default).
    pub fn with_max_record_size(mut self, max: usize) -> Self {
        self.max_record_size = max;
        self
    }

    /// Largest marshalled record this validator accepts.
    pub fn max_record_size(&self) -> usize {
        self.max_record_size
    }

    /// The signature verifier in use.
    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Validate `marshalled` as the current record for `routing_key`.
    ///
    /// Returns the decoded record on success.
    pub async fn validate(&self, routing_key: &[u8], marshalled: &[u8]) -> Result<Record> {
        self.validate_at(routing_key, marshalled, Utc::now()).await
    }

    /// Like [`validate`](Self::validate), with an explicit clock.
    pub async fn validate_at(
        &self,
        routing_key: &[u8],
        marshalled: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Record> {
        match self.check(routing_key, marshalled, now).await {
            Ok(record) => {
                tracing::debug!(
                    sequence = record.sequence,
                    validity = %record.validity,
                    "IPNS record accepted"
                );
                Ok(record)
            }
            Err(e) => {
                tracing::warn!("IPNS record rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Check a decoded record's signature and validity against a known key.
    pub async fn validate_record_with_public_key(
        &self,
        key: &PublicKey,
        record: &Record,
    ) -> Result<()> {
        self.validate_record_with_public_key_at(key, record, Utc::now())
            .await
    }

    pub async fn validate_record_with_public_key_at(
        &self,
        key: &PublicKey,
        record: &Record,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let result = async {
            self.verify_signature(key, record).await?;
            check_validity_at(record, now)
        }
        .await;

        if let Err(e) = &result {
            tracing::warn!("IPNS record rejected: {}", e);
        }
        result
    }

    async fn check(
        &self,
        routing_key: &[u8],
        marshalled: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Record> {
        // 1. Size ceiling, before parsing
        check_record_size(marshalled, self.max_record_size)?;

        // 2. Routing key
        let routing_key = RoutingKey::from_bytes(routing_key)?;

        // 3. Decode
        let record = unmarshal_record(marshalled)?;

        // 4. Resolve and bind the public key
        let key = resolve_public_key(&routing_key, &record)?;

        // 5. V2 signature
        self.verify_signature(&key, &record).await?;

        // 6. Temporal validity
        check_validity_at(&record, now)?;

        Ok(record)
    }

    async fn verify_signature(&self, key: &PublicKey, record: &Record) -> Result<()> {
        let message = record.signature_v2_message();
        match self
            .verifier
            .verify(key, &message, &record.signature_v2)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(ValidationError::SignatureVerification(
                "record signature verification failed".into(),
            )),
            Err(e) => Err(ValidationError::SignatureVerification(e.to_string())),
        }
    }
}

/// Validate with the built-in Ed25519 verifier and the default size ceiling.
pub async fn ipns_validator(routing_key: &[u8], marshalled: &[u8]) -> Result<()> {
    Validator::default()
        .validate(routing_key, marshalled)
        .await
        .map(|_| ())
}

/// Check a decoded record against a known Ed25519 key.
pub async fn validate_record_with_public_key(key: &PublicKey, record: &Record) -> Result<()> {
    Validator::default()
        .validate_record_with_public_key(key, record)
        .await
}

/// Milliseconds until the record expires; zero once it has.
pub fn valid_for(record: &Record) -> Result<u64> {
    valid_for_at(record, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipns_record_core::{marshal_record, Keypair, RecordBuilder};

    const FAR: &str = "2999-01-01T00:00:00.000000000Z";

    fn signed(keypair: &Keypair, validity: &str) -> Record {
        RecordBuilder::new(&"/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu".into(), validity, 1)
            .unwrap()
            .sign(keypair)
            .unwrap()
    }

    #[tokio::test]
    async fn test_accepts_valid_record() {
        let keypair = Keypair::from_seed(&[0x21; 32]);
        let rk = RoutingKey::from_public_key(&keypair.public_key());
        let bytes = marshal_record(&signed(&keypair, FAR));

        let record = Validator::default().validate(rk.as_bytes(), &bytes).await.unwrap();
        assert_eq!(record.sequence, 1);
        assert!(ipns_validator(rk.as_bytes(), &bytes).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_expired() {
        let keypair = Keypair::from_seed(&[0x21; 32]);
        let rk = RoutingKey::from_public_key(&keypair.public_key());
        let bytes = marshal_record(&signed(&keypair, "2000-01-01T00:00:00.000000000Z"));

        let err = Validator::default().validate(rk.as_bytes(), &bytes).await.unwrap_err();
        assert!(matches!(err, ValidationError::RecordExpired));
    }

    #[tokio::test]
    async fn test_size_checked_before_parsing() {
        let rk = RoutingKey::from_public_key(&Keypair::from_seed(&[1; 32]).public_key());
        let junk = vec![0xffu8; 101];
        let err = Validator::default()
            .with_max_record_size(100)
            .validate(rk.as_bytes(), &junk)
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::RecordTooLarge { size: 101, max: 100 }));
    }

    #[tokio::test]
    async fn test_rejects_bad_routing_key() {
        let keypair = Keypair::from_seed(&[0x21; 32]);
        let bytes = marshal_record(&signed(&keypair, FAR));
        let err = Validator::default().validate(b"/ipfs/x", &bytes).await.unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRoutingKey(_)));
    }

    #[tokio::test]
    async fn test_with_public_key() {
        let keypair = Keypair::from_seed(&[0x21; 32]);
        let record = signed(&keypair, FAR);
        assert!(validate_record_with_public_key(&keypair.public_key(), &record)
            .await
            .is_ok());

        let other = Keypair::from_seed(&[0x22; 32]).public_key();
        assert!(matches!(
            validate_record_with_public_key(&other, &record).await,
            Err(ValidationError::SignatureVerification(_))
        ));
    }

    #[test]
    fn test_constructor_defaults() {
        let validator = Validator::new(Ed25519Verifier);
        assert_eq!(validator.max_record_size(), MAX_RECORD_SIZE);
        assert_eq!(validator.with_max_record_size(64).max_record_size(), 64);
        let _: &Ed25519Verifier = Validator::default().verifier();
    }

    #[test]
    fn test_valid_for() {
        let keypair = Keypair::from_seed(&[0x21; 32]);
        assert!(valid_for(&signed(&keypair, FAR)).unwrap() > 0);
        assert_eq!(
            valid_for(&signed(&keypair, "2000-01-01T00:00:00.000000000Z")).unwrap(),
            0
        );
    }
}
