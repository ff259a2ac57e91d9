//! Error types for the IPNS record API.

use ipns_record_core::{CoreError, ValidationError};
use thiserror::Error;

/// Errors that can occur while creating, validating or selecting records.
#[derive(Debug, Error)]
pub enum IpnsError {
    /// The signing capability failed.
    #[error("record signature creation failed: {0}")]
    SignatureCreation(String),

    /// The signer has no private key material.
    #[error("missing private key material for signing")]
    MissingSigningKey,

    /// Format-level error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A record was rejected.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for IPNS record operations.
pub type Result<T> = std::result::Result<T, IpnsError>;
