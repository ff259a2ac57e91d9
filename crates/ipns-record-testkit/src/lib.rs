//! # IPNS Record Testkit
//!
//! Testing utilities for IPNS records.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known inputs with their expected payload bytes and names
//! - **Wire vectors**: Records marshalled by another implementation
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Deterministic identities, plus signers and verifiers for
//!   keys that cannot be inlined in a routing key
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the canonical CBOR payload byte for byte:
//!
//! ```rust
//! use ipns_record_testkit::vectors::{all_vectors, record_from_vector};
//!
//! for vector in all_vectors() {
//!     let record = record_from_vector(&vector).unwrap();
//!     println!("{}: {}", vector.name, hex::encode(&record.data));
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ipns_record_testkit::generators::{RecordParams, record_from_params};
//!
//! proptest! {
//!     #[test]
//!     fn payload_is_deterministic(params: RecordParams) {
//!         let r1 = record_from_params(&params).unwrap();
//!         let r2 = record_from_params(&params).unwrap();
//!         prop_assert_eq!(r1.data, r2.data);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use ipns_record_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::with_seed([7; 32]);
//! let bytes = fixture.make_marshalled("/ipfs/bafkqae3imvwgy3zamzzg63janjzs22lqnzzqu", 1).unwrap();
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    multi_party_fixtures, FailingSigner, FixtureVerifier, LargeKeySigner, PublicOnlySigner,
    TestFixture,
};
pub use generators::{record_from_params, RecordParams};
pub use vectors::{
    all_vectors, record_from_vector, verify_all_vectors, wire_vectors, GoldenVector, VectorReport,
    WireVector,
};
