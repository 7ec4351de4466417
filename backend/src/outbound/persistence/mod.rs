//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories are thin: they translate between Diesel rows (`models.rs`,
//! `schema.rs`, both private) and domain types, and map database failures to
//! the port error enums. Connections come from a `bb8` pool of
//! `diesel-async` connections.
//!
//! # Example
//!
//! ```no_run
//! use fleet_tracker::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! # async fn example() -> Result<(), fleet_tracker::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/tracker")).await?;
//! let users = DieselUserRepository::new(pool);
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_location_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_location_repository::DieselLocationRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
