//! Synchronous validation steps: size ceiling, key resolution and binding,
//! temporal validity. Signature verification is left to the caller's
//! verifier.

use chrono::{DateTime, Utc};

use crate::crypto::PublicKey;
use crate::error::{CoreError, ValidationError};
use crate::record::Record;
use crate::types::{RoutingKey, ValidityType};
use crate::validity::{millis_until, parse_validity};

/// Reject marshalled records larger than `max` bytes.
pub fn check_record_size(bytes: &[u8], max: usize) -> Result<(), ValidationError> {
    if bytes.len() > max {
        return Err(ValidationError::RecordTooLarge {
            size: bytes.len(),
            max,
        });
    }
    Ok(())
}

/// Find the key a record must be verified with, and check it belongs to
/// `routing_key`.
///
/// The embedded key wins if present; otherwise the key must be inlined in
/// the routing key's identity multihash.
pub fn resolve_public_key(
    routing_key: &RoutingKey,
    record: &Record,
) -> Result<PublicKey, ValidationError> {
    // 1. Embedded key
    let embedded = record.embedded_public_key().map_err(|e| match e {
        CoreError::InvalidPublicKey(msg) | CoreError::UnsupportedKeyType(msg) => {
            ValidationError::InvalidEmbeddedPublicKey(msg)
        }
        other => ValidationError::InvalidEmbeddedPublicKey(other.to_string()),
    })?;

    // 2. Fall back to the routing key
    let key = match embedded {
        Some(key) => key,
        None => match routing_key.inline_public_key() {
            Ok(Some(key)) => key,
            Ok(None) => return Err(ValidationError::MissingPublicKey),
            Err(CoreError::InvalidRoutingKey(msg)) => {
                return Err(ValidationError::InvalidRoutingKey(msg))
            }
            Err(_) => return Err(ValidationError::MissingPublicKey),
        },
    };

    // 3. Bind the key to the name
    if RoutingKey::from_public_key(&key) != *routing_key {
        return Err(ValidationError::InvalidEmbeddedPublicKey(
            "public key does not match the routing key".into(),
        ));
    }

    Ok(key)
}

/// The instant the record stops being valid.
pub fn expires_at(record: &Record) -> Result<DateTime<Utc>, ValidationError> {
    match record.validity_type {
        ValidityType::Eol => Ok(parse_validity(&record.validity)?),
    }
}

/// Check that `record` is still valid at `now`.
pub fn check_validity_at(record: &Record, now: DateTime<Utc>) -> Result<(), ValidationError> {
    if expires_at(record)? <= now {
        return Err(ValidationError::RecordExpired);
    }
    Ok(())
}

/// Milliseconds the record remains valid after `now`; zero once expired.
pub fn valid_for_at(record: &Record, now: DateTime<Utc>) -> Result<u64, ValidationError> {
    if record.validity.is_empty() {
        return Err(ValidationError::UnsupportedValidity(
            "record has no validity".into(),
        ));
    }
    Ok(millis_until(expires_at(record)?, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KeyType, Keypair};
    use crate::record::RecordBuilder;
    use bytes::Bytes;
    use chrono::TimeZone;

    const VALIDITY: &str = "2030-01-01T00:00:00.000000000Z";

    fn record(keypair: &Keypair) -> Record {
        RecordBuilder::new(&"/a".into(), VALIDITY, 0)
            .unwrap()
            .sign(keypair)
            .unwrap()
    }

    fn at(nanos_after: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::nanoseconds(nanos_after)
    }

    #[test]
    fn test_size_ceiling() {
        assert!(check_record_size(&vec![0; 10 * 1024], 10 * 1024).is_ok());
        assert!(matches!(
            check_record_size(&vec![0; 10 * 1024 + 1], 10 * 1024),
            Err(ValidationError::RecordTooLarge { size: 10241, max: 10240 })
        ));
    }

    #[test]
    fn test_resolve_from_routing_key() {
        let keypair = Keypair::from_seed(&[1; 32]);
        let rk = RoutingKey::from_public_key(&keypair.public_key());
        let key = resolve_public_key(&rk, &record(&keypair)).unwrap();
        assert_eq!(key, keypair.public_key());
    }

    #[test]
    fn test_resolve_rejects_other_identity() {
        let keypair = Keypair::from_seed(&[1; 32]);
        let mut rec = record(&keypair);
        rec.pub_key = Some(Bytes::from(keypair.public_key().to_protobuf()));

        let other = RoutingKey::from_public_key(&Keypair::from_seed(&[2; 32]).public_key());
        assert!(matches!(
            resolve_public_key(&other, &rec),
            Err(ValidationError::InvalidEmbeddedPublicKey(_))
        ));
    }

    #[test]
    fn test_resolve_missing_key() {
        let keypair = Keypair::from_seed(&[1; 32]);
        let large = PublicKey::new(KeyType::Rsa, vec![5; 300]);
        let rk = RoutingKey::from_public_key(&large);
        assert!(matches!(
            resolve_public_key(&rk, &record(&keypair)),
            Err(ValidationError::MissingPublicKey)
        ));
    }

    #[test]
    fn test_resolve_garbage_embedded_key() {
        let keypair = Keypair::from_seed(&[1; 32]);
        let mut rec = record(&keypair);
        rec.pub_key = Some(Bytes::from_static(&[0x08]));
        let rk = RoutingKey::from_public_key(&keypair.public_key());
        assert!(matches!(
            resolve_public_key(&rk, &rec),
            Err(ValidationError::InvalidEmbeddedPublicKey(_))
        ));
    }

    #[test]
    fn test_expiry_boundary() {
        let rec = record(&Keypair::from_seed(&[1; 32]));
        assert!(check_validity_at(&rec, at(-1)).is_ok());
        assert!(matches!(check_validity_at(&rec, at(0)), Err(ValidationError::RecordExpired)));
        assert!(matches!(check_validity_at(&rec, at(1)), Err(ValidationError::RecordExpired)));
    }

    #[test]
    fn test_unparseable_validity() {
        let mut rec = record(&Keypair::from_seed(&[1; 32]));
        rec.validity = "2030-01-01T00:00:00Z".into();
        assert!(matches!(
            check_validity_at(&rec, at(-1)),
            Err(ValidationError::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn test_valid_for() {
        let mut rec = record(&Keypair::from_seed(&[1; 32]));
        assert_eq!(valid_for_at(&rec, at(-2_500_000_000)).unwrap(), 2500);
        assert_eq!(valid_for_at(&rec, at(1)).unwrap(), 0);

        rec.validity = String::new();
        assert!(matches!(
            valid_for_at(&rec, at(0)),
            Err(ValidationError::UnsupportedValidity(_))
        ));
    }
}
