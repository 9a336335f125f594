//! Password hashing using argon2
//!
//! Provides salted one-way hashing and verification.
//!
//! # Performance Considerations
//!
//! Argon2 is intentionally CPU-intensive. The `_async` variants offload
//! the work to the blocking thread pool so it never stalls the async
//! runtime.

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Password hashing service
///
/// Uses Argon2id, which resists both side-channel and GPU-based attacks.
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using argon2 (blocking operation)
    ///
    /// A fresh salt is generated per call, so hashing the same password
    /// twice yields different outputs.
    pub fn hash(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
        Ok(hash.to_string())
    }

    /// Hash a password asynchronously (non-blocking)
    pub async fn hash_async(password: String) -> Result<String> {
        tokio::task::spawn_blocking(move || Self::hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a hash (blocking operation)
    ///
    /// Argon2's verifier compares in constant time. Fails closed: a
    /// malformed hash yields `false` rather than an error.
    pub fn verify(password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Verify a password asynchronously (non-blocking)
    pub async fn verify_async(password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))
    }
}
