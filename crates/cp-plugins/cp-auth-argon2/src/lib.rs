//! # cp-auth-argon2
//!
//! Argon2id implementation of `AuthProvider`. Every digest carries its own
//! random salt in PHC string format, so equal passwords never share a hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use cp_core::error::{AppError, Result};
use cp_core::traits::AuthProvider;

#[derive(Default)]
pub struct Argon2AuthProvider {
    argon2: Argon2<'static>,
}

impl Argon2AuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthProvider for Argon2AuthProvider {
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
    }

    /// Verifies a plaintext against a stored PHC hash. A malformed stored
    /// hash verifies as false rather than erroring out the login path.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}
