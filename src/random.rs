//! The single shared mutable resource in this crate: a lazily-opened,
//! process-wide handle onto the operating system's cryptographic byte source.
//!
//! Per the design notes this deliberately does not use `rand::thread_rng()`
//! (a userspace PRNG reseeded only periodically); every draw goes straight
//! to `OsRng` so the source always reflects fresh OS entropy.

use std::sync::{Mutex, OnceLock};

use rand::rngs::OsRng;
use rand::RngCore;

use crate::errors::{DsaError, Result};

static SOURCE: OnceLock<Mutex<Option<OsRng>>> = OnceLock::new();

/// Handle onto the process-wide cryptographic random byte source.
pub struct RandomSource;

impl RandomSource {
    fn handle() -> &'static Mutex<Option<OsRng>> {
        SOURCE.get_or_init(|| Mutex::new(Some(OsRng)))
    }

    /// Returns `n` cryptographically random bytes.
    pub fn random_bytes(n: usize) -> Result<Vec<u8>> {
        let mut guard = Self::handle()
            .lock()
            .map_err(|_| DsaError::Randomness("random source lock poisoned".into()))?;
        let rng = guard.get_or_insert_with(|| OsRng);
        let mut buf = vec![0u8; n];
        rng.try_fill_bytes(&mut buf)
            .map_err(|e| DsaError::Randomness(e.to_string()))?;
        Ok(buf)
    }

    /// Releases the cached handle. The next call to `random_bytes` lazily
    /// reopens it. Intended for test isolation, not routine use.
    pub fn teardown() {
        if let Some(mutex) = SOURCE.get() {
            if let Ok(mut guard) = mutex.lock() {
                *guard = None;
            }
        }
    }
}
