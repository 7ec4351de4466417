//! Credential adapters: argon2 password hashing and HS256 bearer tokens.

mod argon2_hasher;
mod jwt_tokens;

pub use argon2_hasher::Argon2PasswordHasher;
pub use jwt_tokens::{JwtTokenService, TokenSecret};
