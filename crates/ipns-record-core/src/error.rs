//! Error types for the IPNS record core.

use thiserror::Error;

/// Format-level errors raised while encoding, decoding or normalizing records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid record data: {0}")]
    InvalidRecordData(String),

    #[error("missing data or signatureV2")]
    MissingSignatureOrData,

    #[error("field \"{0}\" did not match between envelope and canonical payload")]
    FieldMismatch(&'static str),

    #[error("unsupported validity type: {0}")]
    UnsupportedValidity(String),

    #[error("value must be a valid content path starting with /: {0}")]
    InvalidValue(String),

    #[error("unrecognized validity format (not an rfc3339 format): {0}")]
    UnrecognizedValidityFormat(String),

    #[error("invalid lifetime: {0}")]
    InvalidLifetime(String),

    #[error("invalid content identifier: {0}")]
    InvalidCid(String),

    #[error("invalid multihash: {0}")]
    InvalidMultihash(String),

    #[error("invalid routing key: {0}")]
    InvalidRoutingKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Errors returned when a marshalled record is rejected.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("record signature verification failed: {0}")]
    SignatureVerification(String),

    #[error("record has expired")]
    RecordExpired,

    #[error("unsupported validity type: {0}")]
    UnsupportedValidity(String),

    #[error("record is too large: {size} bytes exceeds the maximum of {max}")]
    RecordTooLarge { size: usize, max: usize },

    #[error("invalid record data: {0}")]
    InvalidRecordData(String),

    #[error("invalid record value: {0}")]
    InvalidValue(String),

    #[error("invalid embedded public key: {0}")]
    InvalidEmbeddedPublicKey(String),

    #[error("could not extract public key from record or routing key")]
    MissingPublicKey,

    #[error("unrecognized validity format (not an rfc3339 format): {0}")]
    UnrecognizedFormat(String),

    #[error("invalid routing key: {0}")]
    InvalidRoutingKey(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::MissingSignatureOrData
            | CoreError::FieldMismatch(_)
            | CoreError::InvalidSignature => ValidationError::SignatureVerification(e.to_string()),
            CoreError::UnsupportedValidity(msg) => ValidationError::UnsupportedValidity(msg),
            CoreError::InvalidValue(msg) => ValidationError::InvalidValue(msg),
            CoreError::UnrecognizedValidityFormat(msg) => ValidationError::UnrecognizedFormat(msg),
            CoreError::InvalidRoutingKey(msg) => ValidationError::InvalidRoutingKey(msg),
            CoreError::InvalidPublicKey(msg) | CoreError::UnsupportedKeyType(msg) => {
                ValidationError::InvalidEmbeddedPublicKey(msg)
            }
            CoreError::InvalidRecordData(msg)
            | CoreError::InvalidLifetime(msg)
            | CoreError::InvalidCid(msg)
            | CoreError::InvalidMultihash(msg)
            | CoreError::DecodingError(msg) => ValidationError::InvalidRecordData(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_mismatch_is_signature_failure() {
        let err: ValidationError = CoreError::FieldMismatch("value").into();
        match err {
            ValidationError::SignatureVerification(msg) => {
                assert!(msg.contains("field \"value\" did not match"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_v2_is_signature_failure() {
        let err: ValidationError = CoreError::MissingSignatureOrData.into();
        assert!(matches!(err, ValidationError::SignatureVerification(_)));
    }

    #[test]
    fn test_decoding_error_is_invalid_record_data() {
        let err: ValidationError = CoreError::DecodingError("truncated".into()).into();
        assert!(matches!(err, ValidationError::InvalidRecordData(_)));
    }
}
