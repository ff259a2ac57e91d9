//! # IPNS Record Core
//!
//! Pure primitives for IPNS records: the wire codec, value normalization,
//! validation steps and conflict selection.
//!
//! This crate contains no I/O and no async code. Signing with anything other
//! than a local Ed25519 [`Keypair`] and verifying anything other than Ed25519
//! belong to the `ipns-record` crate's capability traits.
//!
//! ## Key Types
//!
//! - [`Record`] - A signed, versioned pointer from a name to a value
//! - [`RecordBuilder`] - Builds records in V1-compatible or V2-only mode
//! - [`RoutingKey`] - `/ipns/` followed by the publisher's key multihash
//! - [`RecordValue`] - Anything that can be published, before normalization
//!
//! ## Wire format
//!
//! Records travel as a protobuf envelope (see [`envelope`]) whose `data`
//! field holds a deterministic CBOR payload (see [`canonical`]). The payload
//! is authoritative; [`codec::unmarshal_record`] rejects envelopes whose
//! legacy fields disagree with it.

pub mod canonical;
pub mod cid;
pub mod codec;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod multibase;
pub mod multihash;
pub mod normalize;
mod protobuf;
pub mod record;
pub mod selector;
pub mod types;
pub mod validation;
pub mod validity;
pub mod varint;

pub use canonical::RecordPayload;
pub use ciborium::value::Value as CborValue;
pub use cid::{Cid, CidVersion};
pub use codec::{marshal_record, unmarshal_record};
pub use crypto::{Ed25519Signature, KeyType, Keypair, PublicKey};
pub use error::{CoreError, ValidationError};
pub use multihash::Multihash;
pub use normalize::{normalize_byte_value, normalize_value, RecordValue};
pub use record::{embed_public_key, embedded_key_bytes, Record, RecordBuilder};
pub use selector::{compare_records, select};
pub use types::{
    IdKeys, RoutingKey, SignatureMode, ValidityType, DEFAULT_TTL_NS, LONG_TTL_NS, MAX_RECORD_SIZE,
    PK_PREFIX,
};
pub use validity::{format_validity, parse_validity};
