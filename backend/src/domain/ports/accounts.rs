//! Driving port for authentication and roster management.
//!
//! Requests carry already validated domain values; inbound adapters convert
//! raw JSON into these types before calling the port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Actor, Email, Error, LoginCredentials, Password, Role, User, UserId, UserName,
};

/// Public view of a roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identifier.
    #[schema(value_type = i64, example = 7)]
    pub id: UserId,
    /// Login email.
    #[schema(value_type = String, example = "driver@fleet.test")]
    pub email: Email,
    /// Display name.
    #[schema(value_type = String, example = "Jo Driver")]
    pub name: UserName,
    /// Role.
    pub role: Role,
    /// Whether the account may log in.
    pub is_active: bool,
    /// Account that created this one.
    #[schema(value_type = Option<i64>)]
    pub created_by_id: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            is_active: user.is_active,
            created_by_id: user.created_by,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Token plus profile returned by login and registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    /// Bearer token for the `Authorization` header.
    pub access_token: String,
    /// The authenticated account.
    pub user: UserProfile,
}

/// Self-service registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub email: Email,
    pub password: Password,
    pub name: UserName,
}

/// Account created by an admin or super admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: Email,
    pub password: Password,
    pub name: UserName,
    pub role: Role,
    pub is_active: bool,
}

/// Partial account update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountUpdate {
    pub email: Option<Email>,
    pub password: Option<Password>,
    pub name: Option<UserName>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Roster listing filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub page: u32,
    pub limit: u32,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            search: None,
            role: None,
            is_active: None,
            page: 1,
            limit: 10,
        }
    }
}

/// One page of the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub data: Vec<UserProfile>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

/// Authentication and roster use cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Accounts: Send + Sync {
    /// Exchange credentials for a token.
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, Error>;

    /// Create a plain `user` account and log it in.
    async fn register(&self, registration: Registration) -> Result<AuthSession, Error>;

    /// Resolve a bearer token to an active account.
    async fn authenticate(&self, token: &str) -> Result<Actor, Error>;

    /// The caller's own profile.
    async fn profile(&self, actor: Actor) -> Result<UserProfile, Error>;

    /// Filtered, paged roster visible to the caller.
    async fn list_users(&self, actor: Actor, query: UserQuery) -> Result<UserPage, Error>;

    /// One roster entry visible to the caller.
    async fn get_user(&self, actor: Actor, id: UserId) -> Result<UserProfile, Error>;

    /// Create an account owned by the caller.
    async fn create_user(&self, actor: Actor, account: NewAccount) -> Result<UserProfile, Error>;

    /// Update an account the caller manages.
    async fn update_user(
        &self,
        actor: Actor,
        id: UserId,
        update: AccountUpdate,
    ) -> Result<UserProfile, Error>;

    /// Delete an account the caller manages, cascading to its samples.
    async fn delete_user(&self, actor: Actor, id: UserId) -> Result<(), Error>;
}
