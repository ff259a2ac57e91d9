//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical CBOR payload and the published name of
//! a seeded Ed25519 identity, so that any implementation can be checked
//! against the same bytes.

use anyhow::{bail, ensure, Context};
use serde::Serialize;

use ipns_record_core::{
    marshal_record, normalize_value, unmarshal_record, Cid, Keypair, Multihash, Record,
    RecordBuilder, RecordValue, RoutingKey,
};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Seed for deterministic key generation.
    pub seed: [u8; 32],
    /// Record value, already normalized.
    pub value: &'static str,
    /// Canonical validity.
    pub validity: &'static str,
    pub sequence: u64,
    /// TTL in nanoseconds.
    pub ttl: u64,
    /// Expected CBOR payload (hex).
    pub expected_data: &'static str,
    /// Expected `/ipns/<base36 CID>` name of the seeded identity.
    pub expected_name: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "raw identity CID with default TTL",
            seed: [0x42; 32],
            value: "/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu",
            validity: "2030-01-01T00:00:00.000000000Z",
            sequence: 0,
            ttl: 300_000_000_000,
            expected_data: "a56354544c1b00000045d964b8006556616c7565582c2f697066732f6261666b71616533696d76776779337a616d7a7a6736336a616e6a7a7332326c716e7a7a71756853657175656e6365006856616c6964697479581e323033302d30312d30315430303a30303a30302e3030303030303030305a6c56616c69646974795479706500",
            expected_name: "/ipns/k51qzi5uqu5dh0hmqwzu47an7qt7e1h5lyer5kjjntgl9e4qwb07kctxsovmdu",
        },
        GoldenVector {
            name: "pointer to another name with long TTL",
            seed: [0x01; 32],
            value: "/ipns/k51qzi5uqu5djni72pr40dt64kxlh0zb8baat8h7dtdvkov66euc2lho0oidr3",
            validity: "2033-05-18T03:33:20.000000000Z",
            sequence: 1,
            ttl: 3_600_000_000_000,
            expected_data: "a56354544c1b0000034630b8a0006556616c756558442f69706e732f6b3531717a693575717535646a6e69373270723430647436346b786c68307a623862616174386837647464766b6f763636657563326c686f306f696472336853657175656e6365016856616c6964697479581e323033332d30352d31385430333a33333a32302e3030303030303030305a6c56616c69646974795479706500",
            expected_name: "/ipns/k51qzi5uqu5djmw2yvf8kk5cdjc1ddc00o4d5sjwi6f79xzcay9j3gkddw5uu4",
        },
        GoldenVector {
            name: "CIDv0 sub-path, 64-bit sequence, zero TTL",
            seed: [0x00; 32],
            value: "/ipfs/QmWATWQ7fVPP2EFGu71UkfnqhYXDYH566qy47CnJDgvs8u/readme.md",
            validity: "2100-12-31T23:59:59.999999999Z",
            sequence: (1 << 32) + 7,
            ttl: 0,
            expected_data: "a56354544c006556616c7565583e2f697066732f516d5741545751376656505032454647753731556b666e7168595844594835363671793437436e4a4467767338752f726561646d652e6d646853657175656e63651b00000001000000076856616c6964697479581e323130302d31322d33315432333a35393a35392e3939393939393939395a6c56616c69646974795479706500",
            expected_name: "/ipns/k51qzi5uqu5dhnwe629wdlncpql6frppdpwnz4wtlcw816aysd5wwlk63g4wmh",
        },
    ]
}

/// A marshalled record produced outside this crate.
///
/// These were signed by an independent Ed25519 implementation with the
/// seed `00 01 02 .. 1f`, so they pin the envelope layout as other
/// publishers write it. Every record expires in 2040.
#[derive(Debug, Clone)]
pub struct WireVector {
    pub name: &'static str,
    /// The marshalled record (hex).
    pub record: &'static str,
    /// Expected normalized value.
    pub value: &'static str,
    pub sequence: u64,
}

/// Name of the identity that signed every [`WireVector`].
pub const WIRE_VECTOR_NAME: &str =
    "/ipns/k51qzi5uqu5dg9ufswxt229ntzdy7p4125xzv5rtyjso89ajdujg6csfxcj260";

/// Records marshalled by another implementation.
pub fn wire_vectors() -> Vec<WireVector> {
    vec![
        WireVector {
            name: "V1-compatible, text path value",
            record: concat!(
                "0a2c2f697066732f6261666b71616533696d76776779337a616d7a7a6736336a616e6a7a7332326c716e7a7a",
                "7175124074cc7123c3fea6e26a57c1b793728ba0741ecd4dfc16317f9b4dc454b0e6fffe69b6bf69ed8d124c",
                "e726492da88863d354f801112e21dcc0feaa449a4a1070031800221e323034302d30312d30315430303a3030",
                "3a30302e3030303030303030305a28053080c0e285e36842405bbb8834606e97862082ad44b62faad909cc3a",
                "f2ad32380c05fa09e45f740418bd4eca521d5d115f192f8aa39d9710e3225249b74083a502742442254e647a",
                "024a8301a56354544c1b0000034630b8a0006556616c7565582c2f697066732f6261666b71616533696d7677",
                "6779337a616d7a7a6736336a616e6a7a7332326c716e7a7a71756853657175656e6365056856616c69646974",
                "79581e323034302d30312d30315430303a30303a30302e3030303030303030305a6c56616c69646974795479",
                "706500",
            ),
            value: "/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu",
            sequence: 5,
        },
        WireVector {
            name: "V1-compatible, binary CIDv1 value",
            record: concat!(
                "0a2401551220a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a4471240b63c9048",
                "5a439fee4212196f006225d964f2d157cb7b10bca202212ec29b1da6002a4b0d65b1356265dc975db7bfa210",
                "2ab2ae17c3083c27bcf7838e74f9f20a1800221e323034302d30362d31355431323a33303a34352e31323334",
                "35363738395a28123080f092cbdd084240c3a78f42d73de4511c4dc44fb6b3987955b8c190665dcffb89bad1",
                "b46250cffb199fdb6243f1b0cce4c287e4e3cf29b76518374666403d11fdfd78afb17201074a7ba56354544c",
                "1b00000045d964b8006556616c7565582401551220a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1e",
                "c0fb85d299a192a4476853657175656e6365126856616c6964697479581e323034302d30362d31355431323a",
                "33303a34352e3132333435363738395a6c56616c69646974795479706500",
            ),
            value: "/ipfs/bafkreifjjcie6lypi6ny7amxnfftagclbuxndqonfipmb64f2km2devei4",
            sequence: 18,
        },
        WireVector {
            name: "V1-compatible, newline-padded value without validityType",
            record: concat!(
                "0a2d2f697066732f6261666b71616533696d76776779337a616d7a7a6736336a616e6a7a7332326c716e7a7a",
                "71750a124041a8ab9beab2c17056021a60578b4d6821c56a2116a8dff1ea4b2ab6f52e4156d684d9bbe7c2a9",
                "da67f5abf57da5ed52a265910dee81570b1db312c2f1204f0c221e323034302d30312d30315430303a30303a",
                "30302e3030303030303030305a28808080808020300042406166b61bfedb2cd8435a92cb65c3a384044761eb",
                "b5e1fdf8a74c4f9a5d448ce9e494552d0c314e908bd2ca5af4d7a722903820832ff5c1eb1db705537ef75805",
                "4a8401a56354544c006556616c7565582d2f697066732f6261666b71616533696d76776779337a616d7a7a67",
                "36336a616e6a7a7332326c716e7a7a71750a6853657175656e63651b00000100000000006856616c69646974",
                "79581e323034302d30312d30315430303a30303a30302e3030303030303030305a6c56616c69646974795479",
                "706500",
            ),
            value: "/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu",
            sequence: 1 << 40,
        },
        WireVector {
            name: "V2-only, pointer to another name",
            record: concat!(
                "4240895cacadb5566328519ab719f7fc710b9cb80f903363e83d22c450a054b62baa7d7f4fc92fc7b32bf2c6",
                "18b67d369e5d518f58c41772e3af70edd48152f3d8044a9b01a56354544c1b0000000df84758006556616c75",
                "6558442f69706e732f6b3531717a693575717535646a6e69373270723430647436346b786c68307a62386261",
                "6174386837647464766b6f763636657563326c686f306f696472336853657175656e6365016856616c696469",
                "7479581e323034302d30312d30315430303a30303a30302e3030303030303030305a6c56616c696469747954",
                "79706500",
            ),
            value: "/ipns/k51qzi5uqu5djni72pr40dt64kxlh0zb8baat8h7dtdvkov66euc2lho0oidr3",
            sequence: 1,
        },
    ]
}

/// Routing key of [`WIRE_VECTOR_NAME`].
pub fn wire_vector_routing_key() -> anyhow::Result<RoutingKey> {
    let cid = Cid::parse(WIRE_VECTOR_NAME.trim_start_matches("/ipns/"))?;
    Ok(RoutingKey::from_multihash(cid.hash()))
}

/// Check that every [`WireVector`] decodes to its expected fields and
/// marshals back to the same bytes.
pub fn verify_wire_vectors() -> anyhow::Result<()> {
    for vector in wire_vectors() {
        let bytes = hex::decode(vector.record).context(vector.name)?;
        let record = unmarshal_record(&bytes).with_context(|| format!("decoding {:?}", vector.name))?;
        ensure!(record.value == vector.value, "{}: value {}", vector.name, record.value);
        ensure!(
            record.sequence == vector.sequence,
            "{}: sequence {}",
            vector.name,
            record.sequence
        );
        ensure!(
            marshal_record(&record) == bytes,
            "{}: re-marshalled bytes differ",
            vector.name
        );
    }
    Ok(())
}

/// Value normalization cases: input, expected normalized form.
pub fn normalization_vectors() -> anyhow::Result<Vec<(RecordValue, &'static str)>> {
    let v0 = Cid::parse("QmWATWQ7fVPP2EFGu71UkfnqhYXDYH566qy47CnJDgvs8u")?;
    let peer: Multihash = Cid::parse("k51qzi5uqu5djni72pr40dt64kxlh0zb8baat8h7dtdvkov66euc2lho0oidr3")?
        .hash()
        .clone();

    Ok(vec![
        (
            RecordValue::Cid(v0.clone()),
            "/ipfs/bafybeiduiecxoeiqs3gyc6r7v3lymmhserldnpw62qjnhmqsulqjxjmtzi",
        ),
        (
            RecordValue::Bytes(v0.to_bytes()),
            "/ipfs/bafybeiduiecxoeiqs3gyc6r7v3lymmhserldnpw62qjnhmqsulqjxjmtzi",
        ),
        (
            RecordValue::Text("bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu".into()),
            "/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu",
        ),
        (
            RecordValue::Text(" /ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu/a.txt ".into()),
            "/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu/a.txt",
        ),
        (
            RecordValue::Multihash(peer),
            "/ipns/k51qzi5uqu5djni72pr40dt64kxlh0zb8baat8h7dtdvkov66euc2lho0oidr3",
        ),
    ])
}

/// Generate a signed record from a golden vector.
pub fn record_from_vector(vector: &GoldenVector) -> anyhow::Result<Record> {
    let keypair = Keypair::from_seed(&vector.seed);
    let record = RecordBuilder::new(&vector.value.into(), vector.validity, vector.sequence)
        .with_context(|| format!("building {:?}", vector.name))?
        .ttl(vector.ttl)
        .sign(&keypair)?;
    Ok(record)
}

/// What one golden vector produced.
#[derive(Debug, Clone, Serialize)]
pub struct VectorReport {
    pub name: String,
    pub data: String,
    pub ipns_name: String,
}

/// Check every golden vector and normalization case.
///
/// Returns what each vector produced; fails on the first mismatch.
pub fn verify_all_vectors() -> anyhow::Result<Vec<VectorReport>> {
    let mut reports = Vec::new();

    for vector in all_vectors() {
        let record = record_from_vector(&vector)?;
        let data = hex::encode(&record.data);
        ensure!(
            data == vector.expected_data,
            "{}: payload {} != expected {}",
            vector.name,
            data,
            vector.expected_data
        );

        let key = Keypair::from_seed(&vector.seed).public_key();
        let ipns_name = normalize_value(&key.into())?;
        ensure!(
            ipns_name == vector.expected_name,
            "{}: name {} != expected {}",
            vector.name,
            ipns_name,
            vector.expected_name
        );

        reports.push(VectorReport {
            name: vector.name.to_string(),
            data,
            ipns_name,
        });
    }

    verify_wire_vectors()?;

    for (input, expected) in normalization_vectors()? {
        let normalized = normalize_value(&input)?;
        if normalized != expected {
            bail!("normalizing {input:?}: got {normalized}, expected {expected}");
        }
    }

    Ok(reports)
}

/// [`verify_all_vectors`] as pretty JSON.
pub fn vectors_json() -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&verify_all_vectors()?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipns_record_core::envelope::IpnsEntry;

    #[test]
    fn test_all_vectors_match() {
        let reports = verify_all_vectors().unwrap();
        assert_eq!(reports.len(), all_vectors().len());
    }

    #[test]
    fn test_vectors_are_deterministic() {
        // Generate each vector twice, verify identical results
        for vector in all_vectors() {
            let r1 = record_from_vector(&vector).unwrap();
            let r2 = record_from_vector(&vector).unwrap();

            assert_eq!(
                marshal_record(&r1),
                marshal_record(&r2),
                "Vector '{}' produced different bytes on regeneration",
                vector.name
            );
        }
    }

    #[test]
    fn test_vectors_survive_roundtrip() {
        for vector in all_vectors() {
            let record = record_from_vector(&vector).unwrap();
            let decoded = unmarshal_record(&marshal_record(&record)).unwrap();
            assert_eq!(decoded.value, vector.value);
            assert_eq!(decoded.sequence, vector.sequence);
            assert_eq!(decoded.ttl, vector.ttl);
        }
    }

    #[test]
    fn test_different_seeds_same_payload() {
        let mut v2 = all_vectors()[0].clone();
        v2.seed = [0x43; 32];

        let r1 = record_from_vector(&all_vectors()[0]).unwrap();
        let r2 = record_from_vector(&v2).unwrap();

        // The payload carries no identity; only the signatures differ
        assert_eq!(r1.data, r2.data);
        assert_ne!(r1.signature_v2, r2.signature_v2);
    }

    #[test]
    fn test_wire_vectors_remarshal_byte_exact() {
        verify_wire_vectors().unwrap();
    }

    #[test]
    fn test_wire_vector_envelope_layouts() {
        let vectors = wire_vectors();
        let entry = |i: usize| IpnsEntry::decode(&hex::decode(vectors[i].record).unwrap()).unwrap();

        assert_eq!(entry(0).validity_type, Some(0));
        assert!(entry(2).signature_v1.is_some());
        assert_eq!(entry(2).validity_type, None);
        assert!(entry(3).signature_v1.is_none());
        assert!(entry(3).value.is_none());
    }

    #[test]
    fn test_vectors_json() {
        let json = vectors_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 3);
    }
}
