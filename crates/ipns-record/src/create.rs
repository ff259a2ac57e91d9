//! Record creation through an async signer.

use std::time::Duration;

use chrono::Utc;
use ipns_record_core::canonical::signature_v2_message;
use ipns_record_core::validity::{canonicalize_expiration, expiration_from_lifetime};
use ipns_record_core::{
    embedded_key_bytes, format_validity, CborValue, Record, RecordBuilder, RecordValue,
    SignatureMode, DEFAULT_TTL_NS,
};

use crate::error::{IpnsError, Result};
use crate::ipns::IpnsConfig;
use crate::signer::{RecordSigner, SignError};

/// Per-record creation options.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOptions {
    /// Caching hint, in nanoseconds.
    pub ttl_ns: u64,
    /// Whether to also produce the legacy V1 signature.
    pub mode: SignatureMode,
    /// Application-defined payload entries.
    pub extensible_data: Vec<(String, CborValue)>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            ttl_ns: DEFAULT_TTL_NS,
            mode: SignatureMode::V1Compatible,
            extensible_data: Vec::new(),
        }
    }
}

impl CreateOptions {
    /// Options following a configuration profile.
    pub fn from_config(config: &IpnsConfig) -> Self {
        Self {
            ttl_ns: u64::try_from(config.default_ttl.as_nanos()).unwrap_or(u64::MAX),
            mode: config.signature_mode,
            extensible_data: Vec::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ns = u64::try_from(ttl.as_nanos()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_mode(mut self, mode: SignatureMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_extensible_data(mut self, key: impl Into<String>, value: CborValue) -> Self {
        self.extensible_data.push((key.into(), value));
        self
    }
}

/// Create a record that stays valid for `lifetime` from now.
pub async fn create_record<S: RecordSigner + ?Sized>(
    signer: &S,
    value: &RecordValue,
    sequence: u64,
    lifetime: Duration,
    options: &CreateOptions,
) -> Result<Record> {
    let expiry = expiration_from_lifetime(Utc::now(), lifetime)?;
    create_with_validity(signer, value, sequence, format_validity(expiry), options).await
}

/// Create a record that stays valid until `expiration` (any RFC 3339 instant).
pub async fn create_record_with_expiration<S: RecordSigner + ?Sized>(
    signer: &S,
    value: &RecordValue,
    sequence: u64,
    expiration: &str,
    options: &CreateOptions,
) -> Result<Record> {
    let validity = canonicalize_expiration(expiration)?;
    create_with_validity(signer, value, sequence, validity, options).await
}

async fn create_with_validity<S: RecordSigner + ?Sized>(
    signer: &S,
    value: &RecordValue,
    sequence: u64,
    validity: String,
    options: &CreateOptions,
) -> Result<Record> {
    let builder = RecordBuilder::new(value, validity, sequence)?
        .ttl(options.ttl_ns)
        .mode(options.mode)
        .extend_extra(options.extensible_data.iter().cloned());

    let data = builder.canonical_data()?;
    let public_key = signer.public_key();
    let pub_key = embedded_key_bytes(&public_key);

    let signature_v2 = sign(signer, &signature_v2_message(&data)).await?;

    let record = match builder.signature_mode() {
        SignatureMode::V1Compatible => {
            let signature_v1 = sign(signer, &builder.signature_v1_message()).await?;
            builder.build_v1_compatible(data, signature_v2, signature_v1, pub_key)
        }
        SignatureMode::V2Only => builder.build_v2_only(data, signature_v2, pub_key),
    };

    tracing::debug!(
        value = %record.value,
        sequence = record.sequence,
        validity = %record.validity,
        mode = ?record.mode(),
        embedded_key = record.pub_key.is_some(),
        "created IPNS record"
    );

    Ok(record)
}

async fn sign<S: RecordSigner + ?Sized>(signer: &S, message: &[u8]) -> Result<Vec<u8>> {
    signer.sign(message).await.map_err(|e| {
        tracing::error!("Record signing failed: {}", e);
        match e {
            SignError::MissingKeyMaterial => IpnsError::MissingSigningKey,
            SignError::Failed(msg) => IpnsError::SignatureCreation(msg),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ipns_record_core::{CoreError, Keypair, PublicKey};

    struct NoKey(PublicKey);

    #[async_trait]
    impl RecordSigner for NoKey {
        fn public_key(&self) -> PublicKey {
            self.0.clone()
        }

        async fn sign(&self, _message: &[u8]) -> std::result::Result<Vec<u8>, SignError> {
            Err(SignError::MissingKeyMaterial)
        }
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let record = create_record(
            &keypair,
            &"/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu".into(),
            0,
            Duration::from_millis(1_000_000),
            &CreateOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(record.sequence, 0);
        assert_eq!(record.ttl, DEFAULT_TTL_NS);
        assert_eq!(record.mode(), SignatureMode::V1Compatible);
        assert!(record.pub_key.is_none());
        assert!(record.validity.ends_with('Z'));
        assert_eq!(record.validity.len(), "2030-01-01T00:00:00.000000000Z".len());
    }

    #[tokio::test]
    async fn test_create_with_expiration() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let record = create_record_with_expiration(
            &keypair,
            &"/a".into(),
            5,
            "2033-05-18T03:33:20.5+00:00",
            &CreateOptions::default().with_mode(SignatureMode::V2Only),
        )
        .await
        .unwrap();

        assert_eq!(record.validity, "2033-05-18T03:33:20.500000000Z");
        assert!(record.signature_v1.is_none());
    }

    #[tokio::test]
    async fn test_bad_expiration() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let err = create_record_with_expiration(
            &keypair,
            &"/a".into(),
            0,
            "next tuesday",
            &CreateOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            IpnsError::Core(CoreError::UnrecognizedValidityFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_material() {
        let signer = NoKey(Keypair::from_seed(&[1; 32]).public_key());
        let err = create_record(
            &signer,
            &"/a".into(),
            0,
            Duration::from_secs(60),
            &CreateOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, IpnsError::MissingSigningKey));
    }

    #[tokio::test]
    async fn test_invalid_value() {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        let err = create_record(
            &keypair,
            &"not-a-path".into(),
            0,
            Duration::from_secs(60),
            &CreateOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, IpnsError::Core(CoreError::InvalidValue(_))));
    }

    #[test]
    fn test_options_from_config() {
        let opts = CreateOptions::from_config(&IpnsConfig::long_ttl());
        assert_eq!(opts.ttl_ns, 3_600_000_000_000);
        assert_eq!(opts.mode, SignatureMode::V1Compatible);
    }
}
