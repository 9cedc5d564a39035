//! DSA key material: the domain parameters `(p, q, g)` plus the derived
//! `pub_key` and optional `priv_key`. A single value type covers both
//! public-only keys (verification) and full key pairs (signing), per §3.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::errors::{DsaError, Result};
use crate::params::{self, DomainParams, ParamGenOptions, ParamGenWitness};
use crate::primality::PrimalityOracle;

/// A DSA key. `priv_key` is `Some` for a full key pair and `None` for a
/// public-only key built for verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DsaKey {
    pub p: BigUint,
    pub q: BigUint,
    pub g: BigUint,
    pub pub_key: BigUint,
    pub priv_key: Option<BigUint>,
}

impl DsaKey {
    /// Builds a key from externally-supplied integers (e.g. read from a PEM
    /// or SSH2 envelope by a collaborator out of this crate's scope). The
    /// caller is responsible for calling `validate()` before relying on the
    /// invariants sign/verify assume; construction itself performs no checks
    /// so it stays allocation-cheap for the common "already-trusted" case.
    pub fn from_parts(
        p: BigUint,
        q: BigUint,
        g: BigUint,
        pub_key: BigUint,
        priv_key: Option<BigUint>,
    ) -> Self {
        Self {
            p,
            q,
            g,
            pub_key,
            priv_key,
        }
    }

    /// Generates a fresh domain-parameter set and derives a key pair from
    /// it, per §4.D.4.
    pub fn generate(opts: &ParamGenOptions) -> Result<Self> {
        let witness = params::generate_params(opts, None)?;
        Self::from_domain(&witness.params)
    }

    /// As `generate`, but also returns the generation witness
    /// `(counter, h, seed)` for audit/replay.
    pub fn generate_with_witness(opts: &ParamGenOptions) -> Result<(Self, ParamGenWitness)> {
        let witness = params::generate_params(opts, None)?;
        let key = Self::from_domain(&witness.params)?;
        Ok((key, witness))
    }

    fn from_domain(domain: &DomainParams) -> Result<Self> {
        let priv_key = params::derive_priv_key(&domain.q)?;
        let pub_key = domain.g.modpow(&priv_key, &domain.p);
        Ok(Self {
            p: domain.p.clone(),
            q: domain.q.clone(),
            g: domain.g.clone(),
            pub_key,
            priv_key: Some(priv_key),
        })
    }

    /// Returns a copy of this key with the private component stripped, for
    /// handing to a verifier.
    pub fn public_only(&self) -> DsaKey {
        DsaKey {
            priv_key: None,
            ..self.clone()
        }
    }

    /// Re-validates the domain-parameter and key-consistency invariants of
    /// §3: `q` and `p` prime, `q | (p - 1)`, `1 < g < p`, `g^q mod p = 1`,
    /// and (if present) `pub_key == g^priv_key mod p`, `0 < priv_key < q`.
    /// Required for keys built via `from_parts` before use; keys produced by
    /// `generate`/`generate_with_witness` already satisfy these by
    /// construction.
    pub fn validate(&self) -> Result<()> {
        if self.p.is_zero() || self.q.is_zero() {
            return Err(DsaError::Usage("p and q must be non-zero".into()));
        }
        if !PrimalityOracle::is_probable_prime(&self.q) {
            return Err(DsaError::Usage("q is not prime".into()));
        }
        if !PrimalityOracle::is_probable_prime(&self.p) {
            return Err(DsaError::Usage("p is not prime".into()));
        }
        if !(&self.p - 1u32).is_multiple_of(&self.q) {
            return Err(DsaError::Usage("q does not divide p - 1".into()));
        }
        if self.g <= BigUint::one() || self.g >= self.p {
            return Err(DsaError::Usage("g must satisfy 1 < g < p".into()));
        }
        if self.g.modpow(&self.q, &self.p) != BigUint::one() {
            return Err(DsaError::Usage("g does not have order q mod p".into()));
        }
        if self.pub_key.is_zero() {
            return Err(DsaError::Usage("pub_key must be non-zero".into()));
        }
        if let Some(priv_key) = &self.priv_key {
            if priv_key.is_zero() || priv_key >= &self.q {
                return Err(DsaError::Usage(
                    "priv_key must satisfy 0 < priv_key < q".into(),
                ));
            }
            if self.g.modpow(priv_key, &self.p) != self.pub_key {
                return Err(DsaError::Usage(
                    "pub_key does not match g^priv_key mod p".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard::Standard;

    #[test]
    fn test_key_generation_invariants() {
        let opts = ParamGenOptions::new(512);
        let key = DsaKey::generate(&opts).unwrap();

        assert_eq!(crate::num_util::bitsize(&key.p), 512);
        assert_eq!(crate::num_util::bitsize(&key.q), 160);
        assert_eq!(
            key.pub_key,
            key.g.modpow(key.priv_key.as_ref().unwrap(), &key.p)
        );
        let priv_key = key.priv_key.as_ref().unwrap();
        assert!(priv_key < &key.q && !priv_key.is_zero());
        key.validate().unwrap();
    }

    #[test]
    fn test_key_generation_186_4_256() {
        let opts = ParamGenOptions::new(2048).with_standard(Standard::Fips186_4);
        let (key, witness) = DsaKey::generate_with_witness(&opts).unwrap();

        assert_eq!(crate::num_util::bitsize(&key.q), 256);
        assert!(!witness.seed.is_empty());
        key.validate().unwrap();
    }

    #[test]
    fn test_public_only_strips_priv_key() {
        let opts = ParamGenOptions::new(512);
        let key = DsaKey::generate(&opts).unwrap();
        let public = key.public_only();
        assert!(public.priv_key.is_none());
        assert_eq!(public.pub_key, key.pub_key);
    }

    #[test]
    fn test_validate_rejects_tampered_generator() {
        let opts = ParamGenOptions::new(512);
        let mut key = DsaKey::generate(&opts).unwrap();
        key.g = BigUint::one();
        assert!(key.validate().is_err());
    }

    #[test]
    fn test_from_parts_requires_explicit_validate() {
        let opts = ParamGenOptions::new(512);
        let key = DsaKey::generate(&opts).unwrap();
        let rebuilt = DsaKey::from_parts(
            key.p.clone(),
            key.q.clone(),
            key.g.clone(),
            key.pub_key.clone(),
            key.priv_key.clone(),
        );
        rebuilt.validate().unwrap();
    }
}
