//! Password hashing (Argon2id, PHC string format).

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::ProfileError;

/// Stored in place of a hash when a profile has no usable password.
pub const UNUSABLE_PASSWORD: &str = "!";

/// Hash a raw password with a fresh random salt.
pub fn hash_password(raw_password: &str) -> Result<String, ProfileError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(raw_password.as_bytes(), &salt)
        .map_err(|e| ProfileError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check a raw password against a stored hash. Unusable or malformed hashes
/// never verify.
pub fn verify_password(raw_password: &str, stored_hash: &str) -> bool {
    if stored_hash.starts_with(UNUSABLE_PASSWORD) {
        return false;
    }
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(raw_password.as_bytes(), &parsed)
        .is_ok()
}
