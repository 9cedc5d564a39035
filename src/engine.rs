//! The top-level library surface: `DsaEngine`, wrapping ParamGen and
//! SignVerify behind the three public operations named in §6.

use crate::errors::Result;
use crate::keys::DsaKey;
use crate::params::{ParamGenOptions, ParamGenWitness};
use crate::signing::{self, SignInput, Signature};
use crate::standard::Standard;

/// Entry point for domain-parameter generation, key derivation, and
/// signing/verification. Carries only the default `Standard` a caller
/// constructed it with; every operation also accepts an override.
#[derive(Clone, Copy, Debug, Default)]
pub struct DsaEngine {
    standard: Standard,
}

impl DsaEngine {
    pub fn new(standard: Option<Standard>) -> Self {
        Self {
            standard: standard.unwrap_or_default(),
        }
    }

    /// Generates domain parameters and derives a key pair from them, per
    /// §4.D/§4.D.4. `opts.standard` governs the generation; pass it through
    /// `ParamGenOptions::with_standard` to override the engine's default.
    pub fn keygen(&self, opts: &ParamGenOptions) -> Result<DsaKey> {
        DsaKey::generate(opts)
    }

    /// As `keygen`, but also returns the generation witness for audit/replay.
    pub fn keygen_with_witness(
        &self,
        opts: &ParamGenOptions,
    ) -> Result<(DsaKey, ParamGenWitness)> {
        DsaKey::generate_with_witness(opts)
    }

    /// Signs `input` under `key`. `standard` overrides the engine default
    /// when given; it governs which hash digests a `SignInput::Message`.
    pub fn sign(
        &self,
        key: &DsaKey,
        input: SignInput<'_>,
        standard: Option<Standard>,
    ) -> Result<Signature> {
        signing::sign(key, input, standard.unwrap_or(self.standard))
    }

    /// Verifies `signature` over `input` under `key`.
    pub fn verify(
        &self,
        key: &DsaKey,
        signature: &Signature,
        input: SignInput<'_>,
        standard: Option<Standard>,
    ) -> Result<bool> {
        signing::verify(key, signature, input, standard.unwrap_or(self.standard))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_end_to_end_default_standard() {
        let engine = DsaEngine::new(None);
        let key = engine.keygen(&ParamGenOptions::new(512)).unwrap();
        let sig = engine
            .sign(&key, SignInput::Message(b"foo bar"), None)
            .unwrap();
        assert!(engine
            .verify(&key, &sig, SignInput::Message(b"foo bar"), None)
            .unwrap());
        assert!(!engine
            .verify(&key, &sig, SignInput::Message(b"foo baz"), None)
            .unwrap());
    }

    #[test]
    fn test_engine_186_4_explicit_standard() {
        let engine = DsaEngine::new(Some(Standard::Fips186_4));
        let opts = ParamGenOptions::new(2048).with_standard(Standard::Fips186_4);
        let (key, witness) = engine.keygen_with_witness(&opts).unwrap();
        assert_eq!(crate::num_util::bitsize(&key.q), 256);
        assert!(witness.counter < 4 * 2048);

        let sig = engine
            .sign(&key, SignInput::Message(b"hello"), None)
            .unwrap();
        assert!(engine
            .verify(&key, &sig, SignInput::Message(b"hello"), None)
            .unwrap());
    }
}
