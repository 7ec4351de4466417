//! Authentication primitives such as login credentials and passwords.
//!
//! Inbound adapters build these from raw strings before talking to a port so
//! the services only ever see validated values.

use zeroize::Zeroizing;

use super::{Email, UserValidationError};

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 6;

/// Validation failures for credential payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    /// Email failed validation.
    #[error(transparent)]
    Email(#[from] UserValidationError),
    /// Password was empty.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Password shorter than [`PASSWORD_MIN`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum length.
        min: usize,
    },
}

/// Plain-text password awaiting hashing; wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Validate a new password against the length policy.
    pub fn new(raw: &str) -> Result<Self, CredentialsValidationError> {
        if raw.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        if raw.chars().count() < PASSWORD_MIN {
            return Err(CredentialsValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Borrow the secret.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(**redacted**)")
    }
}

/// Validated login credentials.
///
/// The password is only checked for presence; length policy applies to new
/// passwords, not to login attempts.
///
/// # Examples
/// ```
/// use fleet_tracker::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Admin@Fleet.Test", "secret").unwrap();
/// assert_eq!(creds.email().as_ref(), "admin@fleet.test");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Login email.
    #[must_use]
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
