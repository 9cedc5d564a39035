//! FIPS 186-2 / FIPS 186-4 domain-parameter generation (`ParamGen`, §4.D).
//! This is the heart of the crate: seed-driven construction of `q`, the
//! counter-bounded search for `p`, generator derivation, and the primality
//! regimen tying it all together.

use std::ops::ControlFlow;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::errors::{DsaError, Result};
use crate::hash::DigestAlgorithm;
use crate::num_util;
use crate::primality::PrimalityOracle;
use crate::random::RandomSource;
use crate::standard::Standard;

/// Which Miller-Rabin/proof policy ParamGen applies to `p` and `q`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Prove {
    /// Probable-prime regimen only.
    #[default]
    None,
    /// Prove `p` with an unconditional certificate; `q` stays probable.
    P,
    /// Prove `q` with an unconditional certificate; `p` stays probable.
    Q,
    /// Prove both `p` and `q`.
    Both,
}

impl Prove {
    fn proves_p(self) -> bool {
        matches!(self, Prove::P | Prove::Both)
    }

    fn proves_q(self) -> bool {
        matches!(self, Prove::Q | Prove::Both)
    }

    /// Accepts the same surface the original dynamic `Prove` option did:
    /// absent/"0"/"false" => None, "P"/"p" => P, "Q"/"q" => Q, "1"/"true"/
    /// any other truthy string => Both. Anything else is a usage error.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw {
            None => Ok(Prove::None),
            Some(s) => match s.to_ascii_lowercase().as_str() {
                "" | "0" | "false" => Ok(Prove::None),
                "p" => Ok(Prove::P),
                "q" => Ok(Prove::Q),
                "1" | "true" => Ok(Prove::Both),
                other => Err(DsaError::Usage(format!(
                    "Prove must be one of P, Q, or a boolean, got {other:?}"
                ))),
            },
        }
    }
}

/// Which ParamGen sub-stage an `on_progress` callback invocation reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressPhase {
    FindingQ,
    FindingP,
    DerivingGenerator,
}

/// Caller-supplied options for `generate_params`. Enumerated explicitly
/// (rather than a dynamic option dictionary) so unrecognized options are a
/// compile error, per the design notes.
#[derive(Clone, Debug)]
pub struct ParamGenOptions {
    pub size: u64,
    pub qsize: Option<u64>,
    pub seed: Option<Vec<u8>>,
    pub standard: Standard,
    pub prove: Prove,
    pub verbosity: u8,
}

impl ParamGenOptions {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            qsize: None,
            seed: None,
            standard: Standard::default(),
            prove: Prove::default(),
            verbosity: 0,
        }
    }

    pub fn with_qsize(mut self, qsize: u64) -> Self {
        self.qsize = Some(qsize);
        self
    }

    pub fn with_seed(mut self, seed: Vec<u8>) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_standard(mut self, standard: Standard) -> Self {
        self.standard = standard;
        self
    }

    pub fn with_prove(mut self, prove: Prove) -> Self {
        self.prove = prove;
        self
    }
}

/// The `(p, q, g)` triple produced by `generate_params`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainParams {
    pub p: BigUint,
    pub q: BigUint,
    pub g: BigUint,
}

/// `generate_params`'s full output: the accepted domain parameters plus the
/// audit/replay witness (§3 "Generation witness").
#[derive(Clone, Debug)]
pub struct ParamGenWitness {
    pub params: DomainParams,
    pub counter: u64,
    pub h: BigUint,
    pub seed: Vec<u8>,
}

type ProgressHook<'a> = dyn FnMut(ProgressPhase, u64) -> ControlFlow<()> + 'a;

fn report(
    hook: &mut Option<&mut ProgressHook<'_>>,
    phase: ProgressPhase,
    iteration: u64,
) -> Result<()> {
    if let Some(cb) = hook.as_mut() {
        if cb(phase, iteration).is_break() {
            return Err(DsaError::Cancelled);
        }
    }
    Ok(())
}

/// Resolves `N` from the caller's options and the selected standard,
/// applying FIPS 186-2's fixed `N = 160` and FIPS 186-4's size-dependent
/// default, and validates `L`/`N` together. §4.D table, §4.D.5.
fn resolve_qsize(opts: &ParamGenOptions) -> Result<u64> {
    if opts.size < 256 {
        return Err(DsaError::Usage(format!(
            "Size must be >= 256, got {}",
            opts.size
        )));
    }

    let n = match opts.standard {
        Standard::Fips186_2 => match opts.qsize {
            Some(n) if n != 160 => {
                return Err(DsaError::Usage(format!(
                    "FIPS 186-2 requires QSize = 160, got {n}"
                )))
            }
            _ => 160,
        },
        Standard::Fips186_4 => {
            let n = opts
                .qsize
                .unwrap_or(if opts.size >= 2048 { 256 } else { 160 });
            if n == 0 || n > 512 {
                return Err(DsaError::Usage(format!(
                    "QSize must be in [1, 512] under FIPS 186-4, got {n}"
                )));
            }
            n
        }
    };

    if opts.size < n + 8 {
        return Err(DsaError::Usage(format!(
            "Size ({}) must be at least QSize + 8 ({})",
            opts.size,
            n + 8
        )));
    }

    Ok(n)
}

/// Generates FIPS 186-2/186-4 domain parameters. The core of the library.
pub fn generate_params(
    opts: &ParamGenOptions,
    mut on_progress: Option<&mut ProgressHook<'_>>,
) -> Result<ParamGenWitness> {
    let n_bits = resolve_qsize(opts)?;
    let l_bits = opts.size;

    let mut caller_seed = opts.seed.clone();
    let mut outer_iteration = 0u64;

    loop {
        outer_iteration += 1;
        if opts.verbosity >= 1 {
            tracing::debug!(outer_iteration, "starting a fresh q/p search");
        }

        let (q, seed) = find_q(opts.standard, n_bits, caller_seed.take(), opts.prove, &mut on_progress)?;
        let find_p_result = find_p(opts.standard, l_bits, n_bits, &q, &seed, opts.prove, &mut on_progress)?;

        let (p, counter) = match find_p_result {
            Some(found) => found,
            None => {
                tracing::warn!("p search exhausted its counter bound, restarting with a fresh q");
                continue;
            }
        };

        let (g, h) = derive_generator(&p, &q);
        report(&mut on_progress, ProgressPhase::DerivingGenerator, 0)?;

        return Ok(ParamGenWitness {
            params: DomainParams { p, q, g },
            counter,
            h,
            seed,
        });
    }
}

/// §4.D.1 step 1 / §4.D.2 step 1: constructs and accepts `q`.
fn find_q(
    standard: Standard,
    n_bits: u64,
    mut caller_seed: Option<Vec<u8>>,
    prove: Prove,
    on_progress: &mut Option<&mut ProgressHook<'_>>,
) -> Result<(BigUint, Vec<u8>)> {
    let mut iteration = 0u64;
    loop {
        iteration += 1;
        report(on_progress, ProgressPhase::FindingQ, iteration)?;

        match standard {
            Standard::Fips186_2 => {
                let seed = take_or_draw_seed(&mut caller_seed, 20, |s| s.len() == 20)?;
                let seed_p1 = increment_be(&seed);
                let sha_seed = DigestAlgorithm::Sha1.digest(&seed);
                let sha_seed_p1 = DigestAlgorithm::Sha1.digest(&seed_p1);
                let mut md: Vec<u8> = sha_seed
                    .iter()
                    .zip(sha_seed_p1.iter())
                    .map(|(a, b)| a ^ b)
                    .collect();
                md[0] |= 0x80;
                let last = md.len() - 1;
                md[last] |= 0x01;
                let q = BigUint::from_bytes_be(&md);

                let entropy_hex = hex::encode(&seed_p1);
                if accept_prime(&q, prove.proves_q(), 19, &entropy_hex) {
                    return Ok((q, seed));
                }
            }
            Standard::Fips186_4 => {
                let seedlen = ((n_bits + 7) / 8) as usize;
                let seed = take_or_draw_seed(&mut caller_seed, seedlen, |s| {
                    s.len() * 8 >= n_bits as usize
                })?;
                let hash = DigestAlgorithm::for_param_gen(standard, n_bits);
                let q_test = BigUint::one() << (n_bits - 1);
                let u = hash.digest_int(&seed) % &q_test;
                let is_odd = u.is_odd();
                let q = &q_test + &u + 1u32 - if is_odd { BigUint::one() } else { BigUint::zero() };

                let nqtests = if n_bits <= 160 { 19 } else { 27 };
                let entropy_hex = hex::encode(&seed);
                if accept_prime(&q, prove.proves_q(), nqtests, &entropy_hex) {
                    return Ok((q, seed));
                }
            }
        }
    }
}

/// Uses the caller's seed exactly once if it satisfies the standard's length
/// rule, otherwise draws a fresh one from the `RandomSource`. Mirrors the
/// legacy "accept the seed once, then discard on rejection" behavior (§9
/// open question: seed rejection is silent, not a hard error).
fn take_or_draw_seed(
    caller_seed: &mut Option<Vec<u8>>,
    fallback_len: usize,
    accept: impl Fn(&[u8]) -> bool,
) -> Result<Vec<u8>> {
    if let Some(seed) = caller_seed.take() {
        if accept(&seed) {
            return Ok(seed);
        }
    }
    RandomSource::random_bytes(fallback_len)
}

fn accept_prime(n: &BigUint, prove: bool, rounds: u32, entropy_hex: &str) -> bool {
    if prove {
        PrimalityOracle::is_provable_prime(n)
    } else {
        PrimalityOracle::is_probable_prime(n) && PrimalityOracle::miller_rabin_random(n, rounds, entropy_hex)
    }
}

/// §4.D.1 step 2 / §4.D.2 step 2: the counter-bounded search for `p`.
/// Returns `None` when the counter bound is exhausted (caller restarts from
/// `find_q` with a fresh seed).
fn find_p(
    standard: Standard,
    l_bits: u64,
    n_bits: u64,
    q: &BigUint,
    seed: &[u8],
    prove: Prove,
    on_progress: &mut Option<&mut ProgressHook<'_>>,
) -> Result<Option<(BigUint, u64)>> {
    let hash = DigestAlgorithm::for_param_gen(standard, n_bits);
    let outlen = hash.output_bits();
    let n = (l_bits + outlen - 1) / outlen - 1; // ceil(L/outlen) - 1
    let b = l_bits - 1 - n * outlen; // only applied under FIPS 186-4, per design note

    let p_test = BigUint::one() << (l_bits - 1);
    let q2 = BigUint::from(2u32) * q;
    let counter_limit = match standard {
        Standard::Fips186_2 => 4096u64,
        Standard::Fips186_4 => 4 * l_bits,
    };
    let nptests = match standard {
        Standard::Fips186_2 => 3,
        Standard::Fips186_4 => {
            if l_bits <= 2048 {
                3
            } else {
                2
            }
        }
    };

    let mut seed_p1 = seed.to_vec();
    let mut counter = 0u64;
    while counter < counter_limit {
        report(on_progress, ProgressPhase::FindingP, counter)?;

        let mut w = BigUint::zero();
        for j in 0..=n {
            seed_p1 = increment_be(&seed_p1);
            let mut chunk = hash.digest_int(&seed_p1);
            if j == n && matches!(standard, Standard::Fips186_4) {
                chunk %= BigUint::one() << b;
            }
            w += chunk * (BigUint::one() << (outlen * j));
        }
        w %= &p_test;

        let x = &w + &p_test;
        let x_mod_q2 = &x % &q2;
        let p = &x - &x_mod_q2 + 1u32;

        if p >= p_test {
            let entropy_hex = hex::encode(&seed_p1);
            if accept_prime(&p, prove.proves_p(), nptests, &entropy_hex) {
                return Ok(Some((p, counter)));
            }
        }
        counter += 1;
    }
    Ok(None)
}

/// §4.D.3: the first `g = h^((p-1)/q) mod p != 1`, starting at `h = 2`.
fn derive_generator(p: &BigUint, q: &BigUint) -> (BigUint, BigUint) {
    let e = (p - 1u32) / q;
    let mut h = BigUint::from(2u32);
    loop {
        let g = h.modpow(&e, p);
        if g != BigUint::one() {
            return (g, h);
        }
        h += 1u32;
    }
}

/// Big-endian increment with carry wrap, used to advance FIPS seed values.
fn increment_be(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    for byte in out.iter_mut().rev() {
        if *byte == 0xFF {
            *byte = 0;
        } else {
            *byte += 1;
            return out;
        }
    }
    out
}

/// §4.D.4: draws `priv_key` uniform in `[1, q-1]`.
pub fn derive_priv_key(q: &BigUint) -> Result<BigUint> {
    loop {
        let candidate = num_util::makerandom(num_util::bitsize(q))? % q;
        if !candidate.is_zero() {
            return Ok(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_be_carries() {
        assert_eq!(increment_be(&[0x00]), vec![0x01]);
        assert_eq!(increment_be(&[0xFF]), vec![0x00]);
        assert_eq!(increment_be(&[0x01, 0xFF]), vec![0x02, 0x00]);
        assert_eq!(increment_be(&[0xFF, 0xFF]), vec![0x00, 0x00]);
    }

    #[test]
    fn test_resolve_qsize_defaults() {
        let opts = ParamGenOptions::new(512);
        assert_eq!(resolve_qsize(&opts).unwrap(), 160);

        let opts = ParamGenOptions::new(2048).with_standard(Standard::Fips186_4);
        assert_eq!(resolve_qsize(&opts).unwrap(), 256);

        let opts = ParamGenOptions::new(1024).with_standard(Standard::Fips186_4);
        assert_eq!(resolve_qsize(&opts).unwrap(), 160);
    }

    #[test]
    fn test_resolve_qsize_rejects_too_small_size() {
        let opts = ParamGenOptions::new(200);
        assert!(resolve_qsize(&opts).is_err());
    }

    #[test]
    fn test_resolve_qsize_rejects_186_2_non_default_n() {
        let opts = ParamGenOptions::new(512).with_qsize(224);
        assert!(resolve_qsize(&opts).is_err());
    }

    #[test]
    fn test_resolve_qsize_rejects_l_too_close_to_n() {
        let opts = ParamGenOptions::new(2048)
            .with_standard(Standard::Fips186_4)
            .with_qsize(2044);
        assert!(resolve_qsize(&opts).is_err());
    }

    #[test]
    fn test_derive_generator_invariants() {
        // Small toy parameters: p = 23, q = 11 divides p-1 = 22.
        let p = BigUint::from(23u32);
        let q = BigUint::from(11u32);
        let (g, _h) = derive_generator(&p, &q);
        assert_ne!(g, BigUint::one());
        assert_eq!(g.modpow(&q, &p), BigUint::one());
        assert!(g > BigUint::one() && g < p);
    }

    #[test]
    fn test_generate_params_512_bit_default_standard() {
        let opts = ParamGenOptions::new(512);
        let witness = generate_params(&opts, None).unwrap();
        let DomainParams { p, q, g } = witness.params;

        assert_eq!(num_util::bitsize(&p), 512);
        assert_eq!(num_util::bitsize(&q), 160);
        assert_eq!((&p - 1u32) % &q, BigUint::zero());
        assert!(g > BigUint::one() && g < p);
        assert_eq!(g.modpow(&q, &p), BigUint::one());
    }

    #[test]
    fn test_generate_params_progress_hook_can_cancel() {
        let opts = ParamGenOptions::new(256);
        let mut calls = 0u64;
        let mut hook = |_phase: ProgressPhase, _iter: u64| -> ControlFlow<()> {
            calls += 1;
            ControlFlow::Break(())
        };
        let result = generate_params(&opts, Some(&mut hook));
        assert!(matches!(result, Err(DsaError::Cancelled)));
        assert!(calls >= 1);
    }

    #[test]
    fn test_derive_priv_key_in_range() {
        let q = BigUint::from(104729u32);
        for _ in 0..20 {
            let x = derive_priv_key(&q).unwrap();
            assert!(!x.is_zero() && x < q);
        }
    }

    #[test]
    fn test_prove_parse() {
        assert_eq!(Prove::parse(None).unwrap(), Prove::None);
        assert_eq!(Prove::parse(Some("")).unwrap(), Prove::None);
        assert_eq!(Prove::parse(Some("0")).unwrap(), Prove::None);
        assert_eq!(Prove::parse(Some("false")).unwrap(), Prove::None);
        assert_eq!(Prove::parse(Some("P")).unwrap(), Prove::P);
        assert_eq!(Prove::parse(Some("p")).unwrap(), Prove::P);
        assert_eq!(Prove::parse(Some("Q")).unwrap(), Prove::Q);
        assert_eq!(Prove::parse(Some("q")).unwrap(), Prove::Q);
        assert_eq!(Prove::parse(Some("1")).unwrap(), Prove::Both);
        assert_eq!(Prove::parse(Some("true")).unwrap(), Prove::Both);
        assert!(Prove::parse(Some("bogus")).is_err());
    }

    #[test]
    fn test_take_or_draw_seed_uses_accepted_caller_seed() {
        let mut caller_seed = Some(vec![0xAAu8; 20]);
        let seed = take_or_draw_seed(&mut caller_seed, 20, |s| s.len() == 20).unwrap();
        assert_eq!(seed, vec![0xAAu8; 20]);
        assert!(caller_seed.is_none());
    }

    #[test]
    fn test_take_or_draw_seed_discards_rejected_caller_seed() {
        let mut caller_seed = Some(vec![0xAAu8; 5]);
        let seed = take_or_draw_seed(&mut caller_seed, 20, |s| s.len() == 20).unwrap();
        assert_eq!(seed.len(), 20);
        assert_ne!(seed, vec![0xAAu8; 5]);
    }

    #[test]
    fn test_generate_params_with_caller_supplied_seed() {
        let opts = ParamGenOptions::new(512).with_seed(vec![0x07u8; 20]);
        let witness = generate_params(&opts, None).unwrap();
        assert_eq!(num_util::bitsize(&witness.params.q), 160);
        assert!(!witness.seed.is_empty());
    }

    #[test]
    fn test_generate_params_prove_both_exercises_provable_path() {
        let opts = ParamGenOptions::new(256).with_prove(Prove::Both);
        let witness = generate_params(&opts, None).unwrap();
        let DomainParams { p, q, g } = witness.params;

        assert!(PrimalityOracle::is_provable_prime(&p));
        assert!(PrimalityOracle::is_provable_prime(&q));
        assert_eq!((&p - 1u32) % &q, BigUint::zero());
        assert_eq!(g.modpow(&q, &p), BigUint::one());
    }
}
