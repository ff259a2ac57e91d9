//! Marshal records to and from their wire bytes.

use bytes::Bytes;

use crate::canonical::{decode_payload, RecordPayload};
use crate::envelope::IpnsEntry;
use crate::error::CoreError;
use crate::normalize::normalize_byte_value;
use crate::record::Record;

/// Encode a record.
///
/// V2-only records carry just `pubKey`, `signatureV2` and `data`; V1-compatible
/// records also repeat the payload fields in the legacy envelope layout.
///
/// The legacy fields are copied from the payload bytes, not from the
/// normalized view, so a decoded record marshals back to the bytes it came
/// from.
pub fn marshal_record(record: &Record) -> Vec<u8> {
    let mut entry = IpnsEntry {
        pub_key: record.pub_key.as_ref().map(|b| b.to_vec()),
        signature_v2: Some(record.signature_v2.to_vec()),
        data: Some(record.data.to_vec()),
        ..Default::default()
    };

    if let Some(signature_v1) = &record.signature_v1 {
        let legacy = decode_payload(&record.data).unwrap_or_else(|_| RecordPayload {
            value: record.value.as_bytes().to_vec(),
            validity: record.validity.as_bytes().to_vec(),
            validity_type: record.validity_type,
            sequence: record.sequence,
            ttl: record.ttl,
            extra: Vec::new(),
        });

        entry.value = Some(legacy.value);
        entry.signature_v1 = Some(signature_v1.to_vec());
        if !record.omit_validity_type {
            entry.validity_type = Some(legacy.validity_type.to_u64());
        }
        entry.validity = Some(legacy.validity);
        entry.sequence = Some(legacy.sequence);
        entry.ttl = Some(legacy.ttl);
    }

    entry.encode()
}

/// Decode a record.
///
/// The canonical payload is authoritative. When the envelope also carries
/// the legacy fields, each one must agree with the payload.
pub fn unmarshal_record(bytes: &[u8]) -> Result<Record, CoreError> {
    let mut entry = IpnsEntry::decode(bytes)?;

    let (signature_v2, data) = match (entry.signature_v2.take(), entry.data.take()) {
        (Some(sig), Some(data)) => (sig, data),
        _ => return Err(CoreError::MissingSignatureOrData),
    };

    let payload = decode_payload(&data)?;
    let value = normalize_byte_value(&payload.value)?;

    if entry.value.is_some() && entry.signature_v1.is_some() {
        check_legacy_fields(&entry, &payload)?;
    }

    let omit_validity_type = entry.signature_v1.is_some() && entry.validity_type.is_none();
    let validity = String::from_utf8(payload.validity)
        .map_err(|_| CoreError::InvalidRecordData("validity is not valid UTF-8".into()))?;

    Ok(Record {
        value,
        validity_type: payload.validity_type,
        validity,
        sequence: payload.sequence,
        ttl: payload.ttl,
        pub_key: entry.pub_key.map(Bytes::from),
        signature_v1: entry.signature_v1.map(Bytes::from),
        signature_v2: Bytes::from(signature_v2),
        data: Bytes::from(data),
        omit_validity_type,
    })
}

fn check_legacy_fields(entry: &IpnsEntry, payload: &RecordPayload) -> Result<(), CoreError> {
    if entry.value.as_deref() != Some(payload.value.as_slice()) {
        return Err(CoreError::FieldMismatch("value"));
    }
    if entry.validity.as_deref() != Some(payload.validity.as_slice()) {
        return Err(CoreError::FieldMismatch("validity"));
    }
    // proto2 enum default
    if entry.validity_type.unwrap_or(0) != payload.validity_type.to_u64() {
        return Err(CoreError::FieldMismatch("validityType"));
    }
    if entry.sequence != Some(payload.sequence) {
        return Err(CoreError::FieldMismatch("sequence"));
    }
    if entry.ttl != Some(payload.ttl) {
        return Err(CoreError::FieldMismatch("ttl"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{encode_payload, signature_v1_message, signature_v2_message};
    use crate::cid::{codec as cid_codec, Cid};
    use crate::crypto::Keypair;
    use crate::multihash::{self, Multihash};
    use crate::record::RecordBuilder;
    use crate::types::{SignatureMode, ValidityType};
    use ciborium::value::Value;

    const VALIDITY: &str = "2030-01-01T00:00:00.000000000Z";

    fn signed(mode: SignatureMode) -> Record {
        RecordBuilder::new(&"/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu".into(), VALIDITY, 3)
            .unwrap()
            .mode(mode)
            .sign(&Keypair::from_seed(&[9; 32]))
            .unwrap()
    }

    #[test]
    fn test_roundtrip_v1_compatible() {
        let record = signed(SignatureMode::V1Compatible);
        let bytes = marshal_record(&record);
        assert_eq!(bytes[0], 0x0a);
        assert_eq!(unmarshal_record(&bytes).unwrap(), record);
    }

    #[test]
    fn test_roundtrip_v2_only() {
        let record = signed(SignatureMode::V2Only);
        let bytes = marshal_record(&record);
        // signatureV2 comes first
        assert_eq!(bytes[0], 0x42);
        let entry = IpnsEntry::decode(&bytes).unwrap();
        assert!(entry.value.is_none());
        assert!(entry.sequence.is_none());
        assert_eq!(unmarshal_record(&bytes).unwrap(), record);
    }

    #[test]
    fn test_roundtrip_preserves_extensible_data() {
        let record = RecordBuilder::new(&"/a".into(), VALIDITY, 0)
            .unwrap()
            .extra("Nested", Value::Map(vec![(Value::Text("k".into()), Value::Bool(true))]))
            .sign(&Keypair::from_seed(&[9; 32]))
            .unwrap();
        let decoded = unmarshal_record(&marshal_record(&record)).unwrap();
        assert_eq!(decoded.data, record.data);
        assert_eq!(decoded.extensible_data().unwrap(), record.extensible_data().unwrap());
    }

    #[test]
    fn test_v1_only_rejected() {
        let entry = IpnsEntry {
            value: Some(b"/a".to_vec()),
            signature_v1: Some(vec![1; 64]),
            validity_type: Some(0),
            validity: Some(VALIDITY.as_bytes().to_vec()),
            sequence: Some(0),
            ttl: Some(0),
            ..Default::default()
        };
        let err = unmarshal_record(&entry.encode()).unwrap_err();
        assert!(matches!(err, CoreError::MissingSignatureOrData));
        assert_eq!(err.to_string(), "missing data or signatureV2");
    }

    #[test]
    fn test_mismatched_fields() {
        let record = signed(SignatureMode::V1Compatible);
        let base = IpnsEntry::decode(&marshal_record(&record)).unwrap();

        let cases: Vec<(&str, Box<dyn Fn(&mut IpnsEntry)>)> = vec![
            ("value", Box::new(|e: &mut IpnsEntry| e.value = Some(b"/ipfs/other".to_vec()))),
            (
                "validity",
                Box::new(|e: &mut IpnsEntry| {
                    e.validity = Some(b"2031-01-01T00:00:00.000000000Z".to_vec())
                }),
            ),
            ("validityType", Box::new(|e: &mut IpnsEntry| e.validity_type = Some(1))),
            ("sequence", Box::new(|e: &mut IpnsEntry| e.sequence = Some(4))),
            ("ttl", Box::new(|e: &mut IpnsEntry| e.ttl = None)),
        ];

        for (field, mutate) in cases {
            let mut entry = base.clone();
            mutate(&mut entry);
            match unmarshal_record(&entry.encode()) {
                Err(CoreError::FieldMismatch(name)) => assert_eq!(name, field),
                other => panic!("{field}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_validity_type_defaults_to_eol() {
        let record = signed(SignatureMode::V1Compatible);
        let mut entry = IpnsEntry::decode(&marshal_record(&record)).unwrap();
        entry.validity_type = None;
        assert!(unmarshal_record(&entry.encode()).is_ok());
    }

    #[test]
    fn test_legacy_fields_ignored_without_v1_signature() {
        let record = signed(SignatureMode::V2Only);
        let mut entry = IpnsEntry::decode(&marshal_record(&record)).unwrap();
        entry.value = Some(b"/ipfs/other".to_vec());
        let decoded = unmarshal_record(&entry.encode()).unwrap();
        assert_eq!(decoded.value, record.value);
    }

    /// A signed V1-compatible envelope carrying `value` exactly as given.
    fn legacy_envelope(value: &[u8], with_validity_type: bool) -> Vec<u8> {
        let keypair = Keypair::from_seed(&[9; 32]);
        let data =
            encode_payload(value, VALIDITY.as_bytes(), ValidityType::Eol, 2, 1_000, &[]).unwrap();
        let v1 = signature_v1_message(value, VALIDITY.as_bytes(), ValidityType::Eol);
        IpnsEntry {
            value: Some(value.to_vec()),
            signature_v1: Some(keypair.sign(&v1).to_vec()),
            validity_type: with_validity_type.then_some(0),
            validity: Some(VALIDITY.as_bytes().to_vec()),
            sequence: Some(2),
            ttl: Some(1_000),
            signature_v2: Some(keypair.sign(&signature_v2_message(&data)).to_vec()),
            data: Some(data),
            ..Default::default()
        }
        .encode()
    }

    #[test]
    fn test_binary_cid_value_roundtrips_byte_exact() {
        let cid = Cid::new_v1(cid_codec::RAW, Multihash::wrap(multihash::SHA2_256, [7u8; 32]));
        let bytes = legacy_envelope(&cid.to_bytes(), true);

        let record = unmarshal_record(&bytes).unwrap();
        assert_eq!(record.value, format!("/ipfs/{cid}"));
        assert_eq!(marshal_record(&record), bytes);
        assert_eq!(unmarshal_record(&marshal_record(&record)).unwrap(), record);
    }

    #[test]
    fn test_padded_value_roundtrips_byte_exact() {
        let bytes = legacy_envelope(b" /ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu\n", true);
        let record = unmarshal_record(&bytes).unwrap();
        assert_eq!(record.value, "/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu");
        assert_eq!(marshal_record(&record), bytes);
    }

    #[test]
    fn test_absent_validity_type_stays_absent() {
        let bytes = legacy_envelope(b"/ipfs/bafkqaaa", false);
        let record = unmarshal_record(&bytes).unwrap();
        assert!(record.omit_validity_type);
        assert_eq!(marshal_record(&record), bytes);

        let built = signed(SignatureMode::V1Compatible);
        assert!(!built.omit_validity_type);
        let entry = IpnsEntry::decode(&marshal_record(&built)).unwrap();
        assert_eq!(entry.validity_type, Some(0));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(unmarshal_record(&[0xff, 0xff, 0xff]).is_err());
        assert!(matches!(unmarshal_record(&[]), Err(CoreError::MissingSignatureOrData)));
    }
}
