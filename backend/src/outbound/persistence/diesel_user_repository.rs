//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::exists;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserListFilter, UserListing, UserRepository, UserRepositoryError};
use crate::domain::{
    Email, NewUser, Role, RosterScope, User, UserChanges, UserCredentials, UserId, UserName,
};

use super::diesel_basic_error_mapping::{
    ConstraintViolation, constraint_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{NewUserRow, UserChangeset, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the roster.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    map_basic_pool_error(error, UserRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_basic_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

/// Like [`map_diesel_error`], but reports unique violations on `email`.
fn map_write_error(email: Option<&str>) -> impl FnOnce(diesel::result::Error) -> UserRepositoryError {
    move |error| match (constraint_violation(&error), email) {
        (Some(ConstraintViolation::Unique), Some(email)) => {
            UserRepositoryError::duplicate_email(email)
        }
        _ => map_diesel_error(error),
    }
}

fn corrupt(field: &str, err: impl std::fmt::Display) -> UserRepositoryError {
    UserRepositoryError::query(format!("stored {field} is invalid: {err}"))
}

fn row_to_credentials(row: UserRow) -> Result<UserCredentials, UserRepositoryError> {
    let UserRow {
        id,
        email,
        name,
        password_hash,
        role,
        is_active,
        created_by_id,
        created_at,
        updated_at,
    } = row;
    let user = User {
        id: UserId::new(id).map_err(|err| corrupt("id", err))?,
        email: Email::new(email).map_err(|err| corrupt("email", err))?,
        name: UserName::new(name).map_err(|err| corrupt("name", err))?,
        role: role.parse::<Role>().map_err(|err| corrupt("role", err))?,
        is_active,
        created_by: created_by_id
            .map(UserId::new)
            .transpose()
            .map_err(|err| corrupt("created_by_id", err))?,
        created_at,
        updated_at,
    };
    Ok(UserCredentials {
        user,
        password_hash,
    })
}

fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    row_to_credentials(row).map(|credentials| credentials.user)
}

/// Escape `LIKE` metacharacters so the search term matches literally.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn scoped(scope: RosterScope) -> users::BoxedQuery<'static, Pg> {
    let query = users::table.into_boxed();
    match scope {
        RosterScope::All => query,
        RosterScope::CreatedBy(creator) => query.filter(users::created_by_id.eq(creator.get())),
    }
}

fn filtered(filter: &UserListFilter) -> users::BoxedQuery<'static, Pg> {
    let mut query = scoped(filter.scope);
    if let Some(search) = filter.search.as_deref() {
        let pattern = like_pattern(search);
        query = query.filter(
            users::name
                .ilike(pattern.clone())
                .or(users::email.ilike(pattern)),
        );
    }
    if let Some(role) = filter.role {
        query = query.filter(users::role.eq(role.as_str()));
    }
    if let Some(is_active) = filter.is_active {
        query = query.filter(users::is_active.eq(is_active));
    }
    query
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_credentials).transpose()
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewUserRow {
            email: user.email.as_ref(),
            name: user.name.as_ref(),
            password_hash: &user.password_hash,
            role: user.role.as_str(),
            is_active: user.is_active,
            created_by_id: user.created_by.map(UserId::get),
        };
        let row = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result::<UserRow>(&mut conn)
            .await
            .map_err(map_write_error(Some(user.email.as_ref())))?;
        row_to_user(row)
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = UserChangeset {
            email: changes.email.as_ref().map(AsRef::as_ref),
            name: changes.name.as_ref().map(AsRef::as_ref),
            password_hash: changes.password_hash.as_deref(),
            role: changes.role.map(Role::as_str),
            is_active: changes.is_active,
            updated_at: Utc::now(),
        };
        let row = diesel::update(users::table.find(id.get()))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_write_error(changeset.email))?;
        row.map(row_to_user).transpose()
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(users::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn list(&self, filter: &UserListFilter) -> Result<UserListing, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let total = filtered(filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let rows = filtered(filter)
            .select(UserRow::as_select())
            .order((users::created_at.desc(), users::id.desc()))
            .offset(filter.offset())
            .limit(i64::from(filter.limit))
            .load::<UserRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let users = rows
            .into_iter()
            .map(row_to_user)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(UserListing { users, total })
    }

    async fn roster(&self, scope: RosterScope) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = scoped(scope)
            .select(UserRow::as_select())
            .order(users::id.asc())
            .load::<UserRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_user).collect()
    }

    async fn any_super_admin(&self) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(exists(
            users::table.filter(users::role.eq(Role::SuperAdmin.as_str())),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(map_diesel_error)
    }
}
