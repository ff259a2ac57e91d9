//! # IPNS Record
//!
//! The unified API for IPNS records: creation through an async signer,
//! validation through an async verifier, and selection between competing
//! copies of a name's record.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use ipns_record::{Ipns, IpnsConfig};
//! use ipns_record::core::Keypair;
//!
//! async fn example() {
//!     let ipns = Ipns::new(Keypair::generate(), IpnsConfig::default());
//!
//!     // Create and marshal a record valid for one day
//!     let published = ipns
//!         .publish("/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu", 0, Duration::from_secs(86_400))
//!         .await
//!         .unwrap();
//!
//!     // Anyone holding the bytes can check them against the routing key
//!     ipns.validate(published.routing_key.as_bytes(), &published.bytes)
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `ipns_record::core` - Wire codec, normalization and pure validation steps

pub mod create;
pub mod error;
pub mod ipns;
pub mod signer;
pub mod validator;

pub use ipns_record_core as core;

pub use create::{create_record, create_record_with_expiration, CreateOptions};
pub use error::{IpnsError, Result};
pub use ipns::{Ipns, IpnsConfig, PublishedRecord};
pub use signer::{Ed25519Verifier, RecordSigner, SignError, SignatureVerifier};
pub use validator::{ipns_validator, valid_for, validate_record_with_public_key, Validator};

pub use ipns_record_core::{
    embed_public_key, marshal_record, normalize_value, select, unmarshal_record, Cid, IdKeys,
    Keypair, Multihash, PublicKey, Record, RecordValue, RoutingKey, SignatureMode,
    ValidationError,
};
