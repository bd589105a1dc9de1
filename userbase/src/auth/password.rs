//! Password hashing with Argon2id and a server-side pepper.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::errors::{AuthError, AuthResult};

/// Hash a password with Argon2id and a fresh random salt
///
/// The pepper is appended to the password before hashing, so digests can
/// only be verified by a process holding the same pepper. The salt lives
/// inside the returned PHC string.
pub fn hash_password(password: &str, pepper: &str) -> AuthResult<String> {
    let peppered = format!("{}{}", password, pepper);
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    Ok(argon2
        .hash_password(peppered.as_bytes(), &salt)
        .map_err(|_| AuthError::HashingFailed)?
        .to_string())
}

/// Verify a password against a stored PHC-encoded digest
///
/// A digest that fails to parse counts as a mismatch, so rows written by
/// unknown or older schemes fail closed instead of erroring.
pub fn verify_password(password: &str, pepper: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };

    let peppered = format!("{}{}", password, pepper);
    Argon2::default()
        .verify_password(peppered.as_bytes(), &parsed)
        .is_ok()
}
