//! Signing and verification capabilities.
//!
//! Records are signed and checked through these traits so that keys held
//! elsewhere (a keystore, a remote signer, a non-Ed25519 key) can be
//! plugged in. The built-in implementations cover local Ed25519 keys.

use async_trait::async_trait;
use ipns_record_core::{CoreError, Keypair, PublicKey};
use thiserror::Error;

/// Why a signer could not produce a signature.
#[derive(Debug, Error)]
pub enum SignError {
    /// The signer only holds a public key.
    #[error("no private key material")]
    MissingKeyMaterial,

    /// The signing backend failed.
    #[error("signing failed: {0}")]
    Failed(String),
}

/// Produces signatures for one identity.
#[async_trait]
pub trait RecordSigner: Send + Sync {
    /// The identity records are published under.
    fn public_key(&self) -> PublicKey;

    /// Sign `message` with the identity's private key.
    async fn sign(&self, message: &[u8]) -> std::result::Result<Vec<u8>, SignError>;
}

#[async_trait]
impl RecordSigner for Keypair {
    fn public_key(&self) -> PublicKey {
        Keypair::public_key(self)
    }

    async fn sign(&self, message: &[u8]) -> std::result::Result<Vec<u8>, SignError> {
        Ok(Keypair::sign(self, message).to_vec())
    }
}

/// Checks signatures made by any identity.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// `Ok(false)` means the signature is well-formed but does not verify.
    async fn verify(
        &self,
        key: &PublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> std::result::Result<bool, CoreError>;
}

/// Verifies Ed25519 signatures; other key types are unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

#[async_trait]
impl SignatureVerifier for Ed25519Verifier {
    async fn verify(
        &self,
        key: &PublicKey,
        message: &[u8],
        signature: &[u8],
    ) -> std::result::Result<bool, CoreError> {
        match key.verify(message, signature) {
            Ok(()) => Ok(true),
            Err(CoreError::InvalidSignature) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
