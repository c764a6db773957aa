use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand_core::OsRng;

use crate::error::{Result, ServiceError};

/// One-way password hashing primitive.
///
/// The core only ever hashes at registration; verification belongs to the login
/// pipeline, which receives the stored hash from `AccountService::authenticate`.
pub trait CredentialHasher: Send + Sync {
    /// Hashes `password` into a self-describing string (salt and parameters included).
    fn hash(&self, password: &str) -> Result<String>;

    /// Checks `password` against a hash produced by [`CredentialHasher::hash`].
    /// A mismatch is `Ok(false)`; only a malformed hash is an error.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Argon2id hasher producing PHC strings (`$argon2id$v=19$...`).
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// Builds a hasher from memory cost (KiB), iterations and parallelism.
    pub fn with_costs(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| ServiceError::Hashing(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Self::new(params))
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ServiceError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| ServiceError::Hashing(format!("Stored hash is malformed: {e}")))?;
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ServiceError::Hashing(e.to_string())),
        }
    }
}
