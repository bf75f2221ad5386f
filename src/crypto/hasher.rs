//! One-way Argon2id hashing for login credentials.

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::SecurityConfig;

/// Hashes and verifies login passwords. Strictly one-way; the recoverable
/// form of a credential is the codec's concern, never this one's.
///
/// `hash` and `verify` are synchronous and CPU-intensive; async callers
/// wrap them in `tokio::task::spawn_blocking` so they do not block the
/// runtime.
#[derive(Clone)]
pub struct CredentialHasher {
    memory_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
}

impl CredentialHasher {
    #[must_use]
    pub const fn new(config: &SecurityConfig) -> Self {
        Self {
            memory_cost_kib: config.argon2_memory_cost_kib,
            time_cost: config.argon2_time_cost,
            parallelism: config.argon2_parallelism,
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(self.memory_cost_kib, self.time_cost, self.parallelism, None)
            .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hashes `plaintext` with a fresh per-call salt and the configured
    /// work factor.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let digest = self
            .argon2()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

        Ok(digest.to_string())
    }

    /// Checks `plaintext` against a stored digest. A malformed digest
    /// verifies as false rather than erroring; the digest carries its own
    /// salt and params.
    #[must_use]
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let Ok(argon2) = self.argon2() else {
            return false;
        };

        PasswordHash::new(digest).map_or(false, |parsed| {
            argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok()
        })
    }
}
