//! Pick the best of several records published under one name.

use std::cmp::Ordering;

use crate::codec::unmarshal_record;
use crate::record::Record;
use crate::types::ValidityType;
use crate::validity::parse_validity;

/// Order two records: higher sequence wins, then the later EOL validity.
///
/// Returns `Greater` when `a` is preferred. Records whose validity cannot be
/// compared are `Equal`.
pub fn compare_records(a: &Record, b: &Record) -> Ordering {
    match a.sequence.cmp(&b.sequence) {
        Ordering::Equal => {}
        other => return other,
    }

    match (a.validity_type, b.validity_type) {
        (ValidityType::Eol, ValidityType::Eol) => {
            match (parse_validity(&a.validity), parse_validity(&b.validity)) {
                (Ok(a_eol), Ok(b_eol)) => a_eol.cmp(&b_eol),
                _ => Ordering::Equal,
            }
        }
    }
}

/// Index of the best decodable candidate, or `None` if none decode.
///
/// Ties keep the earliest candidate. Signatures and expiry are not checked.
///
/// `_routing_key` names the record set the candidates were fetched under, to
/// match the shape of a DHT record validator's `select`. Every candidate is
/// assumed to belong to it and the choice never depends on it; validate
/// the candidates against it first when that assumption does not hold.
pub fn select<B: AsRef<[u8]>>(_routing_key: &[u8], candidates: &[B]) -> Option<usize> {
    let mut best: Option<(usize, Record)> = None;

    for (index, bytes) in candidates.iter().enumerate() {
        let Ok(record) = unmarshal_record(bytes.as_ref()) else {
            continue;
        };
        let replace = match &best {
            None => true,
            Some((_, current)) => compare_records(&record, current) == Ordering::Greater,
        };
        if replace {
            best = Some((index, record));
        }
    }

    best.map(|(index, _)| index)
}
