//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`Accounts`, `LocationIngest`, `LocationQuery`) are called by
//! inbound adapters. Driven ports (repositories, geocoder, publisher, token
//! and password codecs) are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod accounts;
mod location_ingest;
mod location_publisher;
mod location_query;
mod location_repository;
mod password_hasher;
mod reverse_geocoder;
mod token_service;
mod user_repository;

#[cfg(test)]
pub use accounts::MockAccounts;
pub use accounts::{
    AccountUpdate, Accounts, AuthSession, NewAccount, Registration, UserPage, UserProfile,
    UserQuery,
};
#[cfg(test)]
pub use location_ingest::MockLocationIngest;
pub use location_ingest::LocationIngest;
#[cfg(test)]
pub use location_publisher::MockLocationPublisher;
pub use location_publisher::{FixtureLocationPublisher, LocationPublisher, PublishReport};
#[cfg(test)]
pub use location_query::MockLocationQuery;
pub use location_query::LocationQuery;
#[cfg(test)]
pub use location_repository::MockLocationRepository;
pub use location_repository::{
    FixtureLocationRepository, LocationRepository, LocationRepositoryError,
};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{FixturePasswordHasher, PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use reverse_geocoder::MockReverseGeocoder;
pub use reverse_geocoder::{FixtureReverseGeocoder, ReverseGeocoder};
#[cfg(test)]
pub use token_service::MockTokenService;
pub use token_service::{AccessToken, TokenService, TokenServiceError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{
    FixtureUserRepository, UserListFilter, UserListing, UserRepository, UserRepositoryError,
};
