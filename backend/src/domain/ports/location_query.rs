//! Driving port for reading location samples and activity.

use async_trait::async_trait;

use crate::domain::{ActivitySummary, Actor, Error, Location, RouteRange, UserId};

/// Read-side use cases over stored samples.
///
/// Every operation is evaluated on behalf of `actor`. Plain users are pinned
/// to their own samples; a request naming somebody else yields an empty
/// result rather than an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationQuery: Send + Sync {
    /// Samples newest first for `user_id`, or every visible sample when
    /// `None` and the actor is a super admin.
    async fn list(&self, actor: Actor, user_id: Option<UserId>) -> Result<Vec<Location>, Error>;

    /// The newest visible sample, if any.
    async fn latest(&self, actor: Actor, user_id: Option<UserId>)
    -> Result<Option<Location>, Error>;

    /// At most `limit` samples newest first (default 100, capped at 1000).
    async fn history(
        &self,
        actor: Actor,
        user_id: Option<UserId>,
        limit: Option<i64>,
    ) -> Result<Vec<Location>, Error>;

    /// Tracking status for every roster member visible to a privileged actor.
    async fn activity(&self, actor: Actor) -> Result<Vec<ActivitySummary>, Error>;

    /// Samples oldest first inside the lookback `range`. Users outside the
    /// actor's roster are reported as not found.
    async fn route(
        &self,
        actor: Actor,
        user_id: UserId,
        range: RouteRange,
    ) -> Result<Vec<Location>, Error>;
}
