//! Read-side location use cases: listings, activity and routes.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    LocationQuery, LocationRepository, LocationRepositoryError, UserRepository,
    UserRepositoryError,
};
use crate::domain::{
    ActivitySummary, Actor, Error, Location, Role, RouteRange, User, UserId,
};

/// Rows returned by `history` when the caller gives no limit.
pub const HISTORY_LIMIT_DEFAULT: i64 = 100;
/// Largest accepted `history` limit.
pub const HISTORY_LIMIT_MAX: i64 = 1000;

/// Whose samples a read resolves to after role checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// One user's samples.
    User(UserId),
    /// Nothing visible; answer with an empty result.
    Hidden,
}

/// Query service implementing [`LocationQuery`].
pub struct LocationQueryService<L: ?Sized, U: ?Sized> {
    locations: Arc<L>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<L: ?Sized, U: ?Sized> LocationQueryService<L, U> {
    /// Create a new service over the location store and the roster.
    pub fn new(locations: Arc<L>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            locations,
            users,
            clock,
        }
    }
}

impl<L, U> LocationQueryService<L, U>
where
    L: LocationRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    fn map_location_error(error: LocationRepositoryError) -> Error {
        match error {
            LocationRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("location store unavailable: {message}"))
            }
            LocationRepositoryError::Query { message } => {
                Error::internal(format!("location store error: {message}"))
            }
            LocationRepositoryError::UnknownOwner { user_id } => {
                Error::not_found(format!("user {user_id} not found"))
            }
        }
    }

    fn map_user_error(error: UserRepositoryError) -> Error {
        match error {
            UserRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserRepositoryError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserRepositoryError::DuplicateEmail { email } => {
                Error::internal(format!("unexpected duplicate email on read: {email}"))
            }
        }
    }

    fn require_privileged(actor: Actor) -> Result<(), Error> {
        if actor.role.is_privileged() {
            Ok(())
        } else {
            Err(Error::forbidden("admin role required"))
        }
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, Error> {
        self.users.find_by_id(id).await.map_err(Self::map_user_error)
    }

    /// Resolve the samples a read may see.
    ///
    /// Without a `userId` every role reads its own samples. A plain user
    /// naming someone else sees nothing; super admins may name anyone and
    /// admins only users they created.
    async fn resolve_target(
        &self,
        actor: Actor,
        requested: Option<UserId>,
    ) -> Result<Target, Error> {
        let id = match requested {
            None => return Ok(Target::User(actor.id)),
            Some(id) if id == actor.id => return Ok(Target::User(id)),
            Some(id) => id,
        };
        match actor.role {
            Role::User => Ok(Target::Hidden),
            Role::SuperAdmin => Ok(Target::User(id)),
            Role::Admin => {
                let visible = self
                    .find_user(id)
                    .await?
                    .is_some_and(|target| actor.can_view(&target));
                Ok(if visible {
                    Target::User(id)
                } else {
                    Target::Hidden
                })
            }
        }
    }

    /// Single-user reads ignore a plain user's `userId` and answer for the
    /// caller.
    fn pin_plain_user(actor: Actor, requested: Option<UserId>) -> Option<UserId> {
        match actor.role {
            Role::User => Some(actor.id),
            Role::Admin | Role::SuperAdmin => requested,
        }
    }

    fn clamp_history_limit(limit: Option<i64>) -> Result<i64, Error> {
        match limit {
            None => Ok(HISTORY_LIMIT_DEFAULT),
            Some(value) if (1..=HISTORY_LIMIT_MAX).contains(&value) => Ok(value),
            Some(_) => Err(Error::invalid_field(
                "limit",
                "out_of_range",
                format!("limit must be between 1 and {HISTORY_LIMIT_MAX}"),
            )),
        }
    }

    async fn summarise(&self, user: &User) -> Result<ActivitySummary, Error> {
        let latest = self
            .locations
            .latest(Some(user.id))
            .await
            .map_err(Self::map_location_error)?;
        let total = self
            .locations
            .count_for_user(user.id)
            .await
            .map_err(Self::map_location_error)?;
        Ok(ActivitySummary::new(user, latest, total, self.clock.utc()))
    }
}

#[async_trait]
impl<L, U> LocationQuery for LocationQueryService<L, U>
where
    L: LocationRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    async fn list(&self, actor: Actor, user_id: Option<UserId>) -> Result<Vec<Location>, Error> {
        let Target::User(id) = self.resolve_target(actor, user_id).await? else {
            return Ok(Vec::new());
        };
        self.locations
            .list(Some(id), None)
            .await
            .map_err(Self::map_location_error)
    }

    async fn latest(
        &self,
        actor: Actor,
        user_id: Option<UserId>,
    ) -> Result<Option<Location>, Error> {
        let requested = Self::pin_plain_user(actor, user_id);
        let Target::User(id) = self.resolve_target(actor, requested).await? else {
            return Ok(None);
        };
        self.locations
            .latest(Some(id))
            .await
            .map_err(Self::map_location_error)
    }

    async fn history(
        &self,
        actor: Actor,
        user_id: Option<UserId>,
        limit: Option<i64>,
    ) -> Result<Vec<Location>, Error> {
        let limit = Self::clamp_history_limit(limit)?;
        let requested = Self::pin_plain_user(actor, user_id);
        let Target::User(id) = self.resolve_target(actor, requested).await? else {
            return Ok(Vec::new());
        };
        self.locations
            .list(Some(id), Some(limit))
            .await
            .map_err(Self::map_location_error)
    }

    async fn activity(&self, actor: Actor) -> Result<Vec<ActivitySummary>, Error> {
        Self::require_privileged(actor)?;
        let Some(scope) = actor.roster_scope() else {
            return Err(Error::forbidden("admin role required"));
        };
        let roster = self
            .users
            .roster(scope)
            .await
            .map_err(Self::map_user_error)?;
        let mut summaries = Vec::with_capacity(roster.len());
        for user in &roster {
            summaries.push(self.summarise(user).await?);
        }
        Ok(summaries)
    }

    async fn route(
        &self,
        actor: Actor,
        user_id: UserId,
        range: RouteRange,
    ) -> Result<Vec<Location>, Error> {
        Self::require_privileged(actor)?;
        // Missing and out-of-roster users answer identically.
        let not_found = || Error::not_found(format!("user {user_id} not found"));
        let target = self.find_user(user_id).await?.ok_or_else(not_found)?;
        if !actor.can_view(&target) {
            return Err(not_found());
        }
        let to = self.clock.utc();
        let from = to - range.lookback();
        self.locations
            .list_in_window(target.id, from, to)
            .await
            .map_err(Self::map_location_error)
    }
}

#[cfg(test)]
#[path = "location_query_service_tests.rs"]
mod tests;
