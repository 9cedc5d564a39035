//! Big-integer helpers shared by parameter generation and signing: bit-length
//! queries, octet/integer conversions, modular arithmetic, and the two flavors
//! of uniform random integer the rest of the crate builds on.

use num_bigint::{BigInt, BigUint, ToBigInt};
use num_traits::{One, Zero};

use crate::errors::Result;
use crate::random::RandomSource;

/// Number of bits needed to represent `n`. `bitsize(0) == 0`.
pub fn bitsize(n: &BigUint) -> u64 {
    n.bits()
}

/// Treats `bytes` as a big-endian base-256 integer. Empty input is zero.
pub fn os2ip(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Minimal big-endian byte string for `n`. Zero maps to the empty string,
/// unlike `BigUint::to_bytes_be` which returns a single zero byte.
pub fn i2osp(n: &BigUint) -> Vec<u8> {
    if n.is_zero() {
        Vec::new()
    } else {
        n.to_bytes_be()
    }
}

/// `a^e mod n`.
pub fn mod_exp(a: &BigUint, e: &BigUint, n: &BigUint) -> BigUint {
    a.modpow(e, n)
}

/// Multiplicative inverse of `a` modulo `m`, via the extended Euclidean
/// algorithm. `None` when `gcd(a, m) != 1`.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() {
        return None;
    }

    let mut t = BigInt::zero();
    let mut newt = BigInt::one();
    let mut r = m.to_bigint().unwrap();
    let mut newr = a.to_bigint().unwrap();

    while !newr.is_zero() {
        let quotient = &r / &newr;
        (t, newt) = (newt.clone(), &t - &quotient * &newt);
        (r, newr) = (newr.clone(), &r - &quotient * &newr);
    }

    if r > BigInt::one() {
        return None;
    }
    if t < BigInt::zero() {
        t += m.to_bigint().unwrap();
    }
    Some(t.to_biguint().unwrap())
}

/// Draws an integer with exactly `bits` bits, top bit forced set, from the
/// process-wide `RandomSource`.
pub fn makerandom(bits: u64) -> Result<BigUint> {
    if bits == 0 {
        return Ok(BigUint::zero());
    }
    let nbytes = ((bits + 7) / 8) as usize;
    let mut bytes = RandomSource::random_bytes(nbytes)?;
    let extra_bits = (nbytes as u64 * 8) - bits;
    bytes[0] &= 0xFFu8.checked_shr(extra_bits as u32).unwrap_or(0);
    bytes[0] |= 1u8 << (7 - extra_bits);
    Ok(BigUint::from_bytes_be(&bytes))
}

/// Draws an integer uniform in `[0, max]` by rejection sampling from the
/// smallest power-of-two range covering `max`.
pub fn makerandomrange(max: &BigUint) -> Result<BigUint> {
    if max.is_zero() {
        return Ok(BigUint::zero());
    }
    let bits = max.bits();
    loop {
        let candidate = uniform_below_pow2(bits)?;
        if &candidate <= max {
            return Ok(candidate);
        }
    }
}

/// Uniform integer in `[0, 2^bits)`, without forcing any particular bit.
fn uniform_below_pow2(bits: u64) -> Result<BigUint> {
    if bits == 0 {
        return Ok(BigUint::zero());
    }
    let nbytes = ((bits + 7) / 8) as usize;
    let mut bytes = RandomSource::random_bytes(nbytes)?;
    let extra_bits = (nbytes as u64 * 8) - bits;
    bytes[0] &= 0xFFu8.checked_shr(extra_bits as u32).unwrap_or(0);
    Ok(BigUint::from_bytes_be(&bytes))
}
