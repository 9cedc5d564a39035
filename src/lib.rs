//! A FIPS 186-2 / 186-4 Digital Signature Algorithm implementation.
//!
//! Covers domain-parameter generation, key-pair derivation, and signing and
//! verification over arbitrary messages or pre-computed digests. See
//! [`DsaEngine`] for the entry point.

pub mod engine;
pub mod errors;
pub mod hash;
pub mod keys;
pub mod num_util;
pub mod params;
pub mod primality;
pub mod random;
pub mod signing;
pub mod standard;

pub use engine::DsaEngine;
pub use errors::DsaError;
pub use keys::DsaKey;
pub use params::{DomainParams, ParamGenOptions, ParamGenWitness, Prove, ProgressPhase};
pub use signing::{SignInput, Signature};
pub use standard::Standard;

/// Re-export the big-integer types used throughout the public surface.
pub use num_bigint::{BigInt, BigUint};
