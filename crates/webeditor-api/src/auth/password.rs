//! Password hashing and verification using Argon2id
//!
//! New hashes use the work factor from [`PasswordConfig`]. Verification reads
//! the algorithm and parameters back from the stored PHC string, so hashes
//! made under an earlier work factor keep verifying.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;
use webeditor_core::PasswordConfig;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
}

/// Argon2id hasher fixed at service start
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// Build a hasher and its dummy hash from the configured work factor
    ///
    /// # Returns
    ///
    /// * `Ok(PasswordHasher)` - Ready to hash and verify
    /// * `Err(PasswordError)` - If the parameters are out of Argon2's range
    pub fn new(config: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(config.memory_cost, config.time_cost, config.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let filler = SaltString::generate(&mut OsRng);
        let dummy_hash = hash_with(&argon2, filler.as_str())?;

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a plaintext password into a salted PHC string
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, password)
    }

    /// Constant-time comparison of `password` against a stored hash
    ///
    /// A hash that does not parse as PHC never matches.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend the same work as a real verification and discard the outcome
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}
