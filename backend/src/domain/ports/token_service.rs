//! Port for issuing and verifying bearer access tokens.

use crate::domain::{Actor, User};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token adapters.
    pub enum TokenServiceError {
        /// Token could not be produced.
        Issue { message: String } => "token issuance failed: {message}",
        /// Token was malformed, expired or carried a bad signature.
        Invalid { message: String } => "token rejected: {message}",
    }
}

/// Signed bearer token handed to clients after login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap an encoded token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Encoded form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<AccessToken> for String {
    fn from(value: AccessToken) -> Self {
        value.0
    }
}

/// Bearer token codec.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Issue a token identifying `user` and their role.
    fn issue(&self, user: &User) -> Result<AccessToken, TokenServiceError>;

    /// Decode a token into the caller it identifies.
    fn verify(&self, token: &str) -> Result<Actor, TokenServiceError>;
}
