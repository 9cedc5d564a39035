//! The FIPS 186-4 §4.6/§4.7 sign/verify state machine: digest selection and
//! truncation, the per-signature nonce loop, and the verification equation.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::errors::{DsaError, Result};
use crate::hash::DigestAlgorithm;
use crate::keys::DsaKey;
use crate::num_util;
use crate::standard::Standard;

/// A DSA signature: the pair `(r, s)`, each in `[1, q-1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub r: BigUint,
    pub s: BigUint,
}

/// What `sign`/`verify` hash, or don't: a caller-supplied message to digest,
/// or a pre-computed digest to use verbatim, per §4.E.1.
pub enum SignInput<'a> {
    Message(&'a [u8]),
    Digest(&'a [u8]),
}

impl<'a> SignInput<'a> {
    fn resolve(&self, standard: Standard, n_bits: u64) -> Vec<u8> {
        match self {
            SignInput::Digest(d) => d.to_vec(),
            SignInput::Message(m) => DigestAlgorithm::for_signing(standard, n_bits).digest(m),
        }
    }
}

/// §4.E.2: truncates `digest` to `z`, right-shifting when the digest is
/// wider than `N = bitsize(q)`.
fn truncate_digest(digest: &[u8], q: &BigUint) -> BigUint {
    let n_bits = num_util::bitsize(q);
    let outlen = digest.len() as u64 * 8;
    let z = BigUint::from_bytes_be(digest);
    if outlen > n_bits {
        z >> (outlen - n_bits)
    } else {
        z
    }
}

/// Signs `input` under `key`, which must carry a `priv_key`. §4.E.3.
pub fn sign(key: &DsaKey, input: SignInput<'_>, standard: Standard) -> Result<Signature> {
    let priv_key = key
        .priv_key
        .as_ref()
        .ok_or_else(|| DsaError::Usage("sign requires a key with priv_key set".into()))?;

    let n_bits = num_util::bitsize(&key.q);
    let digest = input.resolve(standard, n_bits);
    let z = truncate_digest(&digest, &key.q);

    loop {
        let k = loop {
            let candidate = num_util::makerandom(n_bits)? % &key.q;
            if !candidate.is_zero() {
                break candidate;
            }
        };

        let r = key.g.modpow(&k, &key.p) % &key.q;
        if r.is_zero() {
            tracing::warn!("nonce produced r = 0, redrawing");
            continue;
        }

        let kinv = num_util::mod_inverse(&k, &key.q).ok_or_else(|| {
            DsaError::Internal("nonce was not invertible mod q despite q being prime".into())
        })?;
        let s = (&kinv * (&z + priv_key * &r)) % &key.q;
        if s.is_zero() {
            tracing::warn!("nonce produced s = 0, redrawing");
            continue;
        }

        tracing::info!("signed message, r and s both nonzero");
        return Ok(Signature { r, s });
    }
}

/// Verifies `signature` over `input` under `key`. §4.E.4. Malformed
/// signatures (out-of-range `r`/`s`) are a fast `Ok(false)`, not an error.
pub fn verify(
    key: &DsaKey,
    signature: &Signature,
    input: SignInput<'_>,
    standard: Standard,
) -> Result<bool> {
    if signature.r.is_zero()
        || signature.r >= key.q
        || signature.s.is_zero()
        || signature.s >= key.q
    {
        return Ok(false);
    }

    let n_bits = num_util::bitsize(&key.q);
    let digest = input.resolve(standard, n_bits);
    let z = truncate_digest(&digest, &key.q);

    let w = match num_util::mod_inverse(&signature.s, &key.q) {
        Some(w) => w,
        None => return Ok(false),
    };
    let u1 = (&z * &w) % &key.q;
    let u2 = (&signature.r * &w) % &key.q;
    let v = (key.g.modpow(&u1, &key.p) * key.pub_key.modpow(&u2, &key.p)) % &key.p % &key.q;

    Ok(v == signature.r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamGenOptions;

    fn test_key() -> DsaKey {
        DsaKey::generate(&ParamGenOptions::new(512)).unwrap()
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let key = test_key();
        let sig = sign(&key, SignInput::Message(b"foo bar"), Standard::Fips186_2).unwrap();
        assert!(verify(&key, &sig, SignInput::Message(b"foo bar"), Standard::Fips186_2).unwrap());
    }

    #[test]
    fn test_verify_rejects_tampered_message() {
        let key = test_key();
        let sig = sign(&key, SignInput::Message(b"foo bar"), Standard::Fips186_2).unwrap();
        assert!(!verify(&key, &sig, SignInput::Message(b"foo baz"), Standard::Fips186_2).unwrap());
    }

    #[test]
    fn test_verify_rejects_out_of_range_signature() {
        let key = test_key();
        let bad = Signature {
            r: BigUint::zero(),
            s: BigUint::one(),
        };
        assert!(!verify(&key, &bad, SignInput::Message(b"foo bar"), Standard::Fips186_2).unwrap());

        let bad = Signature {
            r: key.q.clone(),
            s: BigUint::one(),
        };
        assert!(!verify(&key, &bad, SignInput::Message(b"foo bar"), Standard::Fips186_2).unwrap());
    }

    #[test]
    fn test_sign_requires_priv_key() {
        let key = test_key().public_only();
        let result = sign(&key, SignInput::Message(b"foo bar"), Standard::Fips186_2);
        assert!(matches!(result, Err(DsaError::Usage(_))));
    }

    #[test]
    fn test_nonce_freshness_across_signatures() {
        let key = test_key();
        let sig_a = sign(&key, SignInput::Message(b"same message"), Standard::Fips186_2).unwrap();
        let sig_b = sign(&key, SignInput::Message(b"same message"), Standard::Fips186_2).unwrap();
        assert_ne!(sig_a, sig_b, "two signatures over the same message collided");
    }

    #[test]
    fn test_sign_verify_186_4_256() {
        let key = DsaKey::generate(&ParamGenOptions::new(2048).with_standard(Standard::Fips186_4))
            .unwrap();
        let sig = sign(&key, SignInput::Message(b"foo bar"), Standard::Fips186_4).unwrap();
        assert!(verify(&key, &sig, SignInput::Message(b"foo bar"), Standard::Fips186_4).unwrap());
    }

    #[test]
    fn test_sign_verify_precomputed_digest() {
        let key = test_key();
        let digest = DigestAlgorithm::Sha1.digest(b"foo bar");
        let sig = sign(&key, SignInput::Digest(&digest), Standard::Fips186_2).unwrap();
        assert!(verify(&key, &sig, SignInput::Digest(&digest), Standard::Fips186_2).unwrap());
    }
}
