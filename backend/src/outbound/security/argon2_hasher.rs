//! Argon2id implementation of the `PasswordHasher` port.

use argon2::Argon2;
use argon2::password_hash::{
    self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};

use crate::domain::Password;
use crate::domain::ports::{PasswordHasher, PasswordHasherError};

/// Hashes with Argon2id default parameters and a random per-password salt.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

fn map_hash_error(error: password_hash::Error) -> PasswordHasherError {
    PasswordHasherError::hash(error.to_string())
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &Password) -> Result<String, PasswordHasherError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        Argon2::default()
            .hash_password(password.expose().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(map_hash_error)
    }

    fn verify(&self, candidate: &str, hash: &str) -> Result<bool, PasswordHasherError> {
        let parsed = PasswordHash::new(hash).map_err(map_hash_error)?;
        match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(other) => Err(map_hash_error(other)),
        }
    }
}
