//! Digest selection. The standard and `N` chosen at a given call site decide
//! *which* hash runs, so selection here is a runtime enum over the four
//! digest widths FIPS 186-2/186-4 between them require.

use digest::Digest;
use num_bigint::BigUint;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::standard::Standard;

/// One of the digest algorithms this crate ever needs to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Runs the digest over `data`, returning the raw output bytes.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Convenience form returning the digest as a `BigUint`.
    pub fn digest_int(&self, data: &[u8]) -> BigUint {
        BigUint::from_bytes_be(&self.digest(data))
    }

    /// Output width in bits.
    pub fn output_bits(&self) -> u64 {
        match self {
            DigestAlgorithm::Sha1 => 160,
            DigestAlgorithm::Sha256 => 256,
            DigestAlgorithm::Sha384 => 384,
            DigestAlgorithm::Sha512 => 512,
        }
    }

    /// The hash ParamGen's seed-to-candidate construction uses, §4.D.1/§4.D.2:
    /// SHA-1 under the legacy standard, else the SHA-2 variant matching `N`
    /// (256 up to N=256, 384 up to N=384, 512 beyond).
    pub fn for_param_gen(standard: Standard, n_bits: u64) -> Self {
        match standard {
            Standard::Fips186_2 => DigestAlgorithm::Sha1,
            Standard::Fips186_4 => {
                if n_bits <= 256 {
                    DigestAlgorithm::Sha256
                } else if n_bits <= 384 {
                    DigestAlgorithm::Sha384
                } else {
                    DigestAlgorithm::Sha512
                }
            }
        }
    }

    /// The hash `sign`/`verify` use to digest a `Message`, §4.E.1: SHA-1
    /// under the legacy standard, else SHA-256 for `N <= 256` or SHA-512
    /// beyond that.
    pub fn for_signing(standard: Standard, n_bits: u64) -> Self {
        match standard {
            Standard::Fips186_2 => DigestAlgorithm::Sha1,
            Standard::Fips186_4 => {
                if n_bits <= 256 {
                    DigestAlgorithm::Sha256
                } else {
                    DigestAlgorithm::Sha512
                }
            }
        }
    }
}
