//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: process-local repositories used when no database is configured
//! - **geocoding**: Nominatim reverse geocoder over reqwest
//! - **security**: argon2 password hashing and JWT bearer tokens
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod geocoding;
pub mod memory;
pub mod persistence;
pub mod security;
