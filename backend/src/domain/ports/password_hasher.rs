//! Port for one-way password hashing.

use crate::domain::Password;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHasherError {
        /// Hashing or hash parsing failed.
        Hash { message: String } => "password hashing failed: {message}",
    }
}

/// Hash new passwords and check login attempts against stored hashes.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a storable hash for a validated password.
    fn hash(&self, password: &Password) -> Result<String, PasswordHasherError>;

    /// Whether `candidate` matches `hash`.
    fn verify(&self, candidate: &str, hash: &str) -> Result<bool, PasswordHasherError>;
}

/// Reversible hasher for tests: prefixes the password with `plain$`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePasswordHasher;

impl PasswordHasher for FixturePasswordHasher {
    fn hash(&self, password: &Password) -> Result<String, PasswordHasherError> {
        Ok(format!("plain${}", password.expose()))
    }

    fn verify(&self, candidate: &str, hash: &str) -> Result<bool, PasswordHasherError> {
        hash.strip_prefix("plain$")
            .map(|stored| stored == candidate)
            .ok_or_else(|| PasswordHasherError::hash("unrecognised fixture hash"))
    }
}
