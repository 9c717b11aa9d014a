//! # Field Value Hashing
//!
//! One-way hashing for values of hashed fields.
//!
//! ## Invariants
//! - Hashed values only stored as Argon2id digests (random salt per value)
//! - Verification is the only way to compare a plaintext with a stored digest

use std::future::Future;
use std::pin::Pin;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use super::config::HashingConfig;
use super::errors::{CryptoError, CryptoResult};

/// Boxed future returned by hasher operations
pub type HashFuture<'a, T> = Pin<Box<dyn Future<Output = CryptoResult<T>> + Send + 'a>>;

/// One-way hash with verification
pub trait Hasher: Send + Sync {
    /// Hash a plaintext value into a self-describing digest
    fn hash<'a>(&'a self, plaintext: &'a str) -> HashFuture<'a, String>;

    /// Check a plaintext value against a stored digest
    ///
    /// A digest that cannot be parsed verifies as `false`.
    fn verify<'a>(&'a self, plaintext: &'a str, digest: &'a str) -> HashFuture<'a, bool>;
}

/// Argon2id hasher running on the blocking thread pool
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Create a hasher from configuration
    pub fn new(config: &HashingConfig) -> CryptoResult<Self> {
        Ok(Self {
            params: config.params()?,
        })
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Hasher for Argon2Hasher {
    fn hash<'a>(&'a self, plaintext: &'a str) -> HashFuture<'a, String> {
        let params = self.params.clone();
        let plaintext = plaintext.to_owned();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || hash_value(&plaintext, params))
                .await
                .map_err(|e| CryptoError::TaskFailed(e.to_string()))?
        })
    }

    fn verify<'a>(&'a self, plaintext: &'a str, digest: &'a str) -> HashFuture<'a, bool> {
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || verify_value(&plaintext, &digest))
                .await
                .map_err(|e| CryptoError::TaskFailed(e.to_string()))
        })
    }
}

/// Hash a value using Argon2id with a fresh random salt
pub fn hash_value(plaintext: &str, params: Params) -> CryptoResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| CryptoError::HashingFailed)
}

/// Verify a value against its digest; cost parameters are read from the digest
pub fn verify_value(plaintext: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
