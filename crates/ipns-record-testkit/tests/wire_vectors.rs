//! Records marshalled by another implementation validate and survive a
//! decode/encode cycle unchanged.

use chrono::{TimeZone, Utc};
use ipns_record::{marshal_record, select, unmarshal_record, Validator};
use ipns_record_testkit::vectors::{wire_vector_routing_key, wire_vectors};

#[tokio::test]
async fn test_wire_vectors_validate() {
    let rk = wire_vector_routing_key().unwrap();
    let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

    for vector in wire_vectors() {
        let bytes = hex::decode(vector.record).unwrap();
        let record = Validator::default()
            .validate_at(rk.as_bytes(), &bytes, now)
            .await
            .unwrap_or_else(|e| panic!("{}: {e}", vector.name));

        assert_eq!(record.value, vector.value, "{}", vector.name);
        assert_eq!(marshal_record(&record), bytes, "{}", vector.name);
    }
}

#[tokio::test]
async fn test_wire_vectors_expire() {
    let rk = wire_vector_routing_key().unwrap();
    let later = Utc.with_ymd_and_hms(2041, 1, 1, 0, 0, 0).unwrap();
    let bytes = hex::decode(wire_vectors()[0].record).unwrap();

    assert!(Validator::default()
        .validate_at(rk.as_bytes(), &bytes, later)
        .await
        .is_err());
}

#[test]
fn test_wire_vectors_select_highest_sequence() {
    let rk = wire_vector_routing_key().unwrap();
    let candidates: Vec<Vec<u8>> = wire_vectors()
        .iter()
        .map(|v| hex::decode(v.record).unwrap())
        .collect();

    // 1 << 40 beats 18, 5 and 1
    assert_eq!(select(rk.as_bytes(), &candidates), Some(2));
    let best = unmarshal_record(&candidates[2]).unwrap();
    assert!(best.omit_validity_type);
}
