//! Secret store: generation, hashing and verification of pass codes.
//!
//! # Security
//!
//! - Codes carry 256 bits of entropy from the OS RNG, URL-safe base64 encoded.
//! - Only the Argon2id PHC string (salted, parameters embedded) is persisted.
//!   The plaintext exists only in the return value of [`SecretStore::generate_code`].
//! - Verification uses the hash primitive's own comparison routine.
//!
//! Hashing and verification are deliberately slow CPU work. Callers on an
//! async runtime must run them on a blocking thread.

use crate::config::HashCost;
use crate::error::{AccessError, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

/// Number of random bytes in a generated code.
pub const CODE_BYTES: usize = 32;

/// Hashes and verifies opaque access codes.
#[derive(Clone)]
pub struct SecretStore {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretStore").finish_non_exhaustive()
    }
}

impl SecretStore {
    /// Create a store hashing with the given Argon2id cost.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::InternalError` if Argon2 rejects the parameters.
    pub fn new(cost: HashCost) -> Result<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| AccessError::InternalError(format!("Invalid Argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Generate a fresh plaintext code.
    #[must_use]
    pub fn generate_code() -> String {
        let mut bytes = [0u8; CODE_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Hash a code into a PHC string.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::InternalError` if hashing fails.
    pub fn hash_code(&self, code: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(code.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AccessError::InternalError(format!("Failed to hash code: {e}")))
    }

    /// Check a code against a stored hash.
    ///
    /// A mismatch, and a stored hash that cannot be parsed, are both plain `false`.
    #[must_use]
    pub fn verify_code(&self, code: &str, secret_hash: &str) -> bool {
        match PasswordHash::new(secret_hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(code.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored secret hash is not a valid PHC string");
                false
            }
        }
    }
}
