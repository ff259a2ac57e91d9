//! Proptest generators for property-based testing.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use ipns_record_core::cid::codec;
use ipns_record_core::{
    format_validity, multihash, CborValue, Cid, CoreError, Keypair, Multihash, PublicKey, Record,
    RecordBuilder, RecordValue, SignatureMode, LONG_TTL_NS,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random Ed25519 public key.
pub fn public_key() -> impl Strategy<Value = PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate a sequence number. Zero is valid.
pub fn sequence() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Generate a TTL in nanoseconds, up to one day.
pub fn ttl() -> impl Strategy<Value = u64> {
    0u64..=24 * LONG_TTL_NS
}

/// Generate a canonical validity between 1970 and 2200.
pub fn validity() -> impl Strategy<Value = String> {
    (0i64..7_258_118_400, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
        match Utc.timestamp_opt(secs, nanos).single() {
            Some(at) => format_validity(at),
            None => "1970-01-01T00:00:00.000000000Z".to_string(),
        }
    })
}

/// Generate a CIDv1 over a SHA2-256 digest.
pub fn cid() -> impl Strategy<Value = Cid> {
    (
        prop_oneof![Just(codec::RAW), Just(codec::DAG_PB), Just(codec::DAG_CBOR)],
        any::<[u8; 32]>(),
    )
        .prop_map(|(codec, digest)| Cid::new_v1(codec, Multihash::wrap(multihash::SHA2_256, digest)))
}

/// Generate an `/ipfs/` path with up to three segments.
pub fn path() -> impl Strategy<Value = String> {
    "/ipfs/[a-z2-7]{8,40}(/[a-zA-Z0-9._-]{1,16}){0,3}".prop_map(String::from)
}

/// Generate any publishable value.
pub fn record_value() -> impl Strategy<Value = RecordValue> {
    prop_oneof![
        path().prop_map(RecordValue::Text),
        path().prop_map(|p| RecordValue::Bytes(p.into_bytes())),
        cid().prop_map(RecordValue::Cid),
        cid().prop_map(|c| RecordValue::Text(c.to_string())),
        cid().prop_map(|c| RecordValue::Bytes(c.to_bytes())),
        public_key().prop_map(RecordValue::PublicKey),
    ]
}

/// Generate a signature mode.
pub fn signature_mode() -> impl Strategy<Value = SignatureMode> {
    prop_oneof![Just(SignatureMode::V1Compatible), Just(SignatureMode::V2Only)]
}

/// Generate extensible data. Lower-case keys never collide with the
/// reserved ones.
pub fn extensible_data() -> impl Strategy<Value = Vec<(String, CborValue)>> {
    prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..3).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(k, v)| (k, CborValue::Integer(v.into())))
            .collect()
    })
}

/// Parameters for generating a record.
#[derive(Debug, Clone)]
pub struct RecordParams {
    pub keypair: Keypair,
    pub value: RecordValue,
    pub validity: String,
    pub sequence: u64,
    pub ttl: u64,
    pub mode: SignatureMode,
    pub extra: Vec<(String, CborValue)>,
}

impl Arbitrary for RecordParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            any::<[u8; 32]>(), // seed
            record_value(),
            validity(),
            sequence(),
            ttl(),
            signature_mode(),
            extensible_data(),
        )
            .prop_map(
                |(seed, value, validity, sequence, ttl, mode, extra)| RecordParams {
                    keypair: Keypair::from_seed(&seed),
                    value,
                    validity,
                    sequence,
                    ttl,
                    mode,
                    extra,
                },
            )
            .boxed()
    }
}

/// Generate a signed record from parameters.
pub fn record_from_params(params: &RecordParams) -> Result<Record, CoreError> {
    RecordBuilder::new(&params.value, params.validity.clone(), params.sequence)?
        .ttl(params.ttl)
        .mode(params.mode)
        .extend_extra(params.extra.iter().cloned())
        .sign(&params.keypair)
}
