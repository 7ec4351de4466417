//! Domain primitives, services and ports.
//!
//! Purpose: hold the fleet-tracking model (users, roles, location samples,
//! activity summaries) together with the use-case services that implement the
//! driving ports. Nothing in here depends on actix, diesel or reqwest.
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable identifiers.
//! - TraceId: request correlation carried in a task-local.
//! - User, Role, Actor: roster model and the role hierarchy.
//! - Location, LocationSample, RouteRange: samples and route windows.
//! - ActivitySummary: per-user tracking status.
//! - LocationIngestService, LocationQueryService, AccountService: use cases.

pub mod activity;
pub mod auth;
pub mod error;
pub mod location;
pub mod ports;
pub mod trace_id;
pub mod user;

mod account_service;
mod location_ingest_service;
mod location_query_service;

pub use self::account_service::{AccountService, PAGE_LIMIT_MAX, SuperAdminBootstrap};
pub use self::activity::{ActivitySummary, TRACKING_WINDOW, is_tracking};
pub use self::auth::{CredentialsValidationError, LoginCredentials, PASSWORD_MIN, Password};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::location::{
    Coordinates, Location, LocationDraft, LocationSample, LocationValidationError, NewLocation,
    RouteRange, RouteRangeParseError,
};
pub use self::location_ingest_service::LocationIngestService;
pub use self::location_query_service::{HISTORY_LIMIT_DEFAULT, HISTORY_LIMIT_MAX, LocationQueryService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    Actor, Email, NewUser, Role, RosterScope, User, UserChanges, UserCredentials, UserId,
    UserName, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use fleet_tracker::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
