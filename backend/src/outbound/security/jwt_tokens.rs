//! HS256 JSON Web Token implementation of the `TokenService` port.
//!
//! Claims carry the user id (`sub`), role and email. Expiry is checked by
//! `jsonwebtoken` against the system clock; issue time comes from the
//! injected [`Clock`] so tests can pin it.

use std::fmt;
use std::sync::Arc;

use chrono::TimeDelta;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::ports::{AccessToken, TokenService, TokenServiceError};
use crate::domain::{Actor, Role, User, UserId};

const EPHEMERAL_SECRET_LEN: usize = 64;

/// Symmetric signing secret, zeroed on drop.
#[derive(Clone)]
pub struct TokenSecret(Zeroizing<Vec<u8>>);

impl TokenSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    /// Random secret for development runs; tokens die with the process.
    pub fn ephemeral() -> Self {
        let mut bytes = vec![0_u8; EPHEMERAL_SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::new(bytes)
    }

    /// Short SHA-256 fingerprint, safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_slice());
        hex::encode(digest.get(..8).unwrap_or_default())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TokenSecret").field(&self.fingerprint()).finish()
    }
}

/// `sub` is the decimal user id; registered claims must be strings for
/// `jsonwebtoken` to count them as present.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: String,
    email: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies bearer tokens signed with a shared secret.
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    pub fn new(secret: &TokenSecret, ttl: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            clock,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user: &User) -> Result<AccessToken, TokenServiceError> {
        let now = self.clock.utc();
        let claims = Claims {
            sub: user.id.get().to_string(),
            role: user.role.as_str().to_owned(),
            email: user.email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map(AccessToken::new)
            .map_err(|err| TokenServiceError::issue(err.to_string()))
    }

    fn verify(&self, token: &str) -> Result<Actor, TokenServiceError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| TokenServiceError::invalid(err.to_string()))?;
        let raw_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|err| TokenServiceError::invalid(format!("subject is not a user id: {err}")))?;
        let id = UserId::new(raw_id).map_err(|err| TokenServiceError::invalid(err.to_string()))?;
        let role = data
            .claims
            .role
            .parse::<Role>()
            .map_err(|err| TokenServiceError::invalid(err.to_string()))?;
        Ok(Actor::new(id, role))
    }
}
