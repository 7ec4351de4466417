//! Port for roster persistence.

use async_trait::async_trait;

use crate::domain::{
    Email, NewUser, Role, RosterScope, User, UserChanges, UserCredentials, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by roster adapters.
    pub enum UserRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
        /// Another account already uses the email.
        DuplicateEmail { email: String } =>
            "email {email} is already registered",
    }
}

/// Filters and paging applied when listing the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserListFilter {
    /// Accounts visible to the caller.
    pub scope: RosterScope,
    /// Case-insensitive substring matched against name or email.
    pub search: Option<String>,
    /// Exact role match.
    pub role: Option<Role>,
    /// Exact active flag match.
    pub is_active: Option<bool>,
    /// Page number, starting at 1.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl UserListFilter {
    /// Rows skipped before the requested page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

/// One page of roster entries plus the total matching the filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserListing {
    /// Entries on the page, newest first.
    pub users: Vec<User>,
    /// Total entries matching the filter.
    pub total: i64,
}

/// Roster persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Load an account by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// Load an account and its password hash by email.
    async fn find_credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, UserRepositoryError>;

    /// Insert a new account.
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError>;

    /// Apply a partial update; `None` when the account does not exist.
    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Delete an account and, by cascade, its samples. Returns whether a row
    /// was removed.
    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError>;

    /// Filtered, paged listing ordered newest first.
    async fn list(&self, filter: &UserListFilter) -> Result<UserListing, UserRepositoryError>;

    /// Every account in `scope`, ordered by id.
    async fn roster(&self, scope: RosterScope) -> Result<Vec<User>, UserRepositoryError>;

    /// Whether at least one super admin exists.
    async fn any_super_admin(&self) -> Result<bool, UserRepositoryError>;
}

/// Fixture roster that is always empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserRepository;

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn find_by_id(&self, _id: UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn find_credentials_by_email(
        &self,
        _email: &Email,
    ) -> Result<Option<UserCredentials>, UserRepositoryError> {
        Ok(None)
    }

    async fn insert(&self, _user: &NewUser) -> Result<User, UserRepositoryError> {
        Err(UserRepositoryError::query("fixture roster is read-only"))
    }

    async fn update(
        &self,
        _id: UserId,
        _changes: &UserChanges,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(None)
    }

    async fn delete(&self, _id: UserId) -> Result<bool, UserRepositoryError> {
        Ok(false)
    }

    async fn list(&self, _filter: &UserListFilter) -> Result<UserListing, UserRepositoryError> {
        Ok(UserListing::default())
    }

    async fn roster(&self, _scope: RosterScope) -> Result<Vec<User>, UserRepositoryError> {
        Ok(Vec::new())
    }

    async fn any_super_admin(&self) -> Result<bool, UserRepositoryError> {
        Ok(false)
    }
}
