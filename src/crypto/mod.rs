//! Hashing for sensitive field values
//!
//! Hashed fields are stored as Argon2id digests. Because every digest carries
//! its own random salt, equality against a plaintext can only be decided by
//! verification, never by comparing encoded values in storage.

mod config;
mod errors;
mod hasher;

pub use config::HashingConfig;
pub use errors::{CryptoError, CryptoResult};
pub use hasher::{hash_value, verify_value, Argon2Hasher, HashFuture, Hasher};
