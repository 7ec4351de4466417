//! Authentication and roster management use cases.
//!
//! Every authorisation rule defers to [`Actor`]: `roster_scope` for
//! visibility, `can_manage` for updates and deletes, and `can_assign_role`
//! for role grants. Accounts outside the caller's roster are reported as not
//! found.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{
    AccountUpdate, Accounts, AuthSession, NewAccount, PasswordHasher, PasswordHasherError,
    Registration, TokenService, TokenServiceError, UserListFilter, UserPage, UserProfile,
    UserQuery, UserRepository, UserRepositoryError,
};
use crate::domain::{
    Actor, Email, Error, LoginCredentials, NewUser, Password, Role, User, UserChanges, UserId,
    UserName,
};

/// Largest accepted roster page size.
pub const PAGE_LIMIT_MAX: u32 = 100;

/// Result of seeding the first super admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuperAdminBootstrap {
    /// A super admin already exists; nothing changed.
    AlreadyPresent,
    /// An existing account with the email was promoted.
    Promoted(User),
    /// A new account was created.
    Created(User),
}

/// Account service implementing [`Accounts`].
pub struct AccountService<U: ?Sized, H: ?Sized, T: ?Sized> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<T>,
}

impl<U: ?Sized, H: ?Sized, T: ?Sized> AccountService<U, H, T> {
    /// Create a new service.
    pub fn new(users: Arc<U>, hasher: Arc<H>, tokens: Arc<T>) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }
}

impl<U, H, T> AccountService<U, H, T>
where
    U: UserRepository + ?Sized,
    H: PasswordHasher + ?Sized,
    T: TokenService + ?Sized,
{
    fn map_repository_error(error: UserRepositoryError) -> Error {
        match error {
            UserRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserRepositoryError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserRepositoryError::DuplicateEmail { .. } => {
                Error::conflict("email is already registered")
            }
        }
    }

    fn map_hasher_error(error: PasswordHasherError) -> Error {
        Error::internal(error.to_string())
    }

    fn invalid_credentials() -> Error {
        Error::unauthorized("invalid credentials")
    }

    fn not_found(id: UserId) -> Error {
        Error::not_found(format!("user {id} not found"))
    }

    fn issue_session(&self, user: User) -> Result<AuthSession, Error> {
        let token = self.tokens.issue(&user).map_err(|err| match err {
            TokenServiceError::Issue { message } | TokenServiceError::Invalid { message } => {
                Error::internal(format!("token issuance failed: {message}"))
            }
        })?;
        Ok(AuthSession {
            access_token: token.into(),
            user: user.into(),
        })
    }

    async fn find(&self, id: UserId) -> Result<Option<User>, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(Self::map_repository_error)
    }

    /// Load an account the actor may see, hiding everything else as missing.
    async fn find_visible(&self, actor: Actor, id: UserId) -> Result<User, Error> {
        let target = self.find(id).await?.ok_or_else(|| Self::not_found(id))?;
        if target.id == actor.id || actor.can_view(&target) {
            Ok(target)
        } else {
            Err(Self::not_found(id))
        }
    }

    fn validate_page(query: &UserQuery) -> Result<(), Error> {
        if query.page == 0 {
            return Err(Error::invalid_field(
                "page",
                "out_of_range",
                "page must be at least 1",
            ));
        }
        if !(1..=PAGE_LIMIT_MAX).contains(&query.limit) {
            return Err(Error::invalid_field(
                "limit",
                "out_of_range",
                format!("limit must be between 1 and {PAGE_LIMIT_MAX}"),
            ));
        }
        Ok(())
    }

    /// Seed the first super admin.
    ///
    /// Does nothing when a super admin exists. Otherwise promotes the account
    /// registered under `email`, or creates it.
    pub async fn bootstrap_super_admin(
        &self,
        email: Email,
        password: &Password,
        name: UserName,
    ) -> Result<SuperAdminBootstrap, Error> {
        if self
            .users
            .any_super_admin()
            .await
            .map_err(Self::map_repository_error)?
        {
            return Ok(SuperAdminBootstrap::AlreadyPresent);
        }
        let existing = self
            .users
            .find_credentials_by_email(&email)
            .await
            .map_err(Self::map_repository_error)?;
        if let Some(credentials) = existing {
            let changes = UserChanges {
                role: Some(Role::SuperAdmin),
                is_active: Some(true),
                ..UserChanges::default()
            };
            let id = credentials.user.id;
            let promoted = self
                .users
                .update(id, &changes)
                .await
                .map_err(Self::map_repository_error)?
                .ok_or_else(|| Self::not_found(id))?;
            info!(user_id = %promoted.id, "promoted existing account to super admin");
            return Ok(SuperAdminBootstrap::Promoted(promoted));
        }
        let record = NewUser {
            email,
            name,
            password_hash: self.hasher.hash(password).map_err(Self::map_hasher_error)?,
            role: Role::SuperAdmin,
            is_active: true,
            created_by: None,
        };
        let created = self
            .users
            .insert(&record)
            .await
            .map_err(Self::map_repository_error)?;
        info!(user_id = %created.id, "created super admin");
        Ok(SuperAdminBootstrap::Created(created))
    }
}

#[async_trait]
impl<U, H, T> Accounts for AccountService<U, H, T>
where
    U: UserRepository + ?Sized,
    H: PasswordHasher + ?Sized,
    T: TokenService + ?Sized,
{
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthSession, Error> {
        let stored = self
            .users
            .find_credentials_by_email(credentials.email())
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(Self::invalid_credentials)?;
        let matches = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
            .map_err(Self::map_hasher_error)?;
        if !matches {
            return Err(Self::invalid_credentials());
        }
        if !stored.user.is_active {
            return Err(Error::unauthorized("account disabled"));
        }
        self.issue_session(stored.user)
    }

    async fn register(&self, registration: Registration) -> Result<AuthSession, Error> {
        let record = NewUser {
            email: registration.email,
            name: registration.name,
            password_hash: self
                .hasher
                .hash(&registration.password)
                .map_err(Self::map_hasher_error)?,
            role: Role::User,
            is_active: true,
            created_by: None,
        };
        let user = self
            .users
            .insert(&record)
            .await
            .map_err(Self::map_repository_error)?;
        info!(user_id = %user.id, "registered account");
        self.issue_session(user)
    }

    async fn authenticate(&self, token: &str) -> Result<Actor, Error> {
        let claimed = self
            .tokens
            .verify(token)
            .map_err(|_| Error::unauthorized("invalid or expired token"))?;
        let user = self
            .find(claimed.id)
            .await?
            .ok_or_else(|| Error::unauthorized("invalid or expired token"))?;
        if !user.is_active {
            return Err(Error::unauthorized("account disabled"));
        }
        // The stored role wins over the one baked into the token.
        Ok(Actor::new(user.id, user.role))
    }

    async fn profile(&self, actor: Actor) -> Result<UserProfile, Error> {
        self.find(actor.id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| Self::not_found(actor.id))
    }

    async fn list_users(&self, actor: Actor, query: UserQuery) -> Result<UserPage, Error> {
        let scope = actor
            .roster_scope()
            .ok_or_else(|| Error::forbidden("admin role required"))?;
        Self::validate_page(&query)?;
        let filter = UserListFilter {
            scope,
            search: query
                .search
                .map(|raw| raw.trim().to_owned())
                .filter(|value| !value.is_empty()),
            role: query.role,
            is_active: query.is_active,
            page: query.page,
            limit: query.limit,
        };
        let listing = self
            .users
            .list(&filter)
            .await
            .map_err(Self::map_repository_error)?;
        let limit = i64::from(query.limit);
        Ok(UserPage {
            data: listing.users.into_iter().map(UserProfile::from).collect(),
            total: listing.total,
            page: query.page,
            limit: query.limit,
            total_pages: (listing.total + limit - 1) / limit,
        })
    }

    async fn get_user(&self, actor: Actor, id: UserId) -> Result<UserProfile, Error> {
        if !actor.role.is_privileged() && id != actor.id {
            return Err(Error::forbidden("admin role required"));
        }
        self.find_visible(actor, id).await.map(UserProfile::from)
    }

    async fn create_user(&self, actor: Actor, account: NewAccount) -> Result<UserProfile, Error> {
        if !actor.role.is_privileged() {
            return Err(Error::forbidden("admin role required"));
        }
        if !actor.can_assign_role(account.role) {
            return Err(Error::forbidden(format!(
                "{} cannot create {} accounts",
                actor.role, account.role
            )));
        }
        let record = NewUser {
            email: account.email,
            name: account.name,
            password_hash: self
                .hasher
                .hash(&account.password)
                .map_err(Self::map_hasher_error)?,
            role: account.role,
            is_active: account.is_active,
            created_by: Some(actor.id),
        };
        let user = self
            .users
            .insert(&record)
            .await
            .map_err(Self::map_repository_error)?;
        info!(user_id = %user.id, created_by = %actor.id, role = %user.role, "created account");
        Ok(user.into())
    }

    async fn update_user(
        &self,
        actor: Actor,
        id: UserId,
        update: AccountUpdate,
    ) -> Result<UserProfile, Error> {
        let target = self.find_visible(actor, id).await?;
        if !actor.can_manage(&target) {
            return Err(Error::forbidden("not allowed to manage this account"));
        }
        if let Some(role) = update.role.filter(|role| !actor.can_assign_role(*role)) {
            return Err(Error::forbidden(format!("{} cannot assign {role}", actor.role)));
        }
        let password_hash = update
            .password
            .as_ref()
            .map(|password| self.hasher.hash(password))
            .transpose()
            .map_err(Self::map_hasher_error)?;
        let changes = UserChanges {
            email: update.email,
            name: update.name,
            password_hash,
            role: update.role,
            is_active: update.is_active,
        };
        if changes.is_empty() {
            return Ok(target.into());
        }
        self.users
            .update(id, &changes)
            .await
            .map_err(Self::map_repository_error)?
            .map(UserProfile::from)
            .ok_or_else(|| Self::not_found(id))
    }

    async fn delete_user(&self, actor: Actor, id: UserId) -> Result<(), Error> {
        if id == actor.id {
            return Err(Error::forbidden("cannot delete your own account"));
        }
        let target = self.find_visible(actor, id).await?;
        if !actor.can_manage(&target) {
            return Err(Error::forbidden("not allowed to manage this account"));
        }
        let removed = self
            .users
            .delete(id)
            .await
            .map_err(Self::map_repository_error)?;
        if !removed {
            return Err(Self::not_found(id));
        }
        info!(user_id = %id, deleted_by = %actor.id, "deleted account");
        Ok(())
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
