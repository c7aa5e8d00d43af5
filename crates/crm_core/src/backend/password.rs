//! Password hashing for locally stored identities.

use super::{BackendError, BackendResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use once_cell::sync::Lazy;

// 8 MiB, 2 passes, 1 lane.
static HASHER: Lazy<Argon2<'static>> = Lazy::new(|| {
    Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(8 * 1024, 2, 1, None).expect("valid argon2 params"),
    )
});

/// PHC-format argon2id hash of `password` with a fresh salt.
pub(crate) fn hash_password(password: &str) -> BackendResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    HASHER
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| BackendError::Unavailable(format!("password hashing failed: {err}")))
}

/// Whether `password` matches a stored PHC hash. Malformed hashes never match.
pub(crate) fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            HASHER
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
