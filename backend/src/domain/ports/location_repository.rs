//! Port for persisting and reading location samples.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Location, NewLocation, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by location store adapters.
    pub enum LocationRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "location repository connection failed: {message}",
        /// Query or insert failed during execution.
        Query { message: String } =>
            "location repository query failed: {message}",
        /// The owning user does not exist.
        UnknownOwner { user_id: i64 } =>
            "location owner {user_id} does not exist",
    }
}

/// Persistence for immutable location samples.
///
/// Adapters stamp `timestamp` on insert and keep it non-decreasing per user in
/// insert order. Listing operations return newest first unless stated
/// otherwise.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Persist a sample and return the stored record.
    async fn insert(&self, location: &NewLocation) -> Result<Location, LocationRepositoryError>;

    /// Most recent sample for `user_id`, or across all users when `None`.
    async fn latest(
        &self,
        user_id: Option<UserId>,
    ) -> Result<Option<Location>, LocationRepositoryError>;

    /// Samples newest first, optionally restricted to one owner and capped at
    /// `limit` rows.
    async fn list(
        &self,
        user_id: Option<UserId>,
        limit: Option<i64>,
    ) -> Result<Vec<Location>, LocationRepositoryError>;

    /// Number of stored samples for a user.
    async fn count_for_user(&self, user_id: UserId) -> Result<i64, LocationRepositoryError>;

    /// Samples for a user with `from <= timestamp <= to`, oldest first.
    async fn list_in_window(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Location>, LocationRepositoryError>;
}

/// Fixture store that accepts nothing and holds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLocationRepository;

#[async_trait]
impl LocationRepository for FixtureLocationRepository {
    async fn insert(&self, location: &NewLocation) -> Result<Location, LocationRepositoryError> {
        Err(LocationRepositoryError::unknown_owner(location.user_id.get()))
    }

    async fn latest(
        &self,
        _user_id: Option<UserId>,
    ) -> Result<Option<Location>, LocationRepositoryError> {
        Ok(None)
    }

    async fn list(
        &self,
        _user_id: Option<UserId>,
        _limit: Option<i64>,
    ) -> Result<Vec<Location>, LocationRepositoryError> {
        Ok(Vec::new())
    }

    async fn count_for_user(&self, _user_id: UserId) -> Result<i64, LocationRepositoryError> {
        Ok(0)
    }

    async fn list_in_window(
        &self,
        _user_id: UserId,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<Location>, LocationRepositoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::Coordinates;

    #[rstest]
    #[tokio::test]
    async fn fixture_rejects_inserts_as_unknown_owner() {
        let user_id = UserId::new(3).expect("valid id");
        let draft = NewLocation {
            user_id,
            coordinates: Coordinates::new(1.0, 2.0).expect("valid coordinates"),
            speed: None,
            heading: None,
            address: None,
        };
        let err = FixtureLocationRepository
            .insert(&draft)
            .await
            .expect_err("fixture has no users");
        assert_eq!(err, LocationRepositoryError::UnknownOwner { user_id: 3 });
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_reads_are_empty() {
        let repo = FixtureLocationRepository;
        assert!(repo.latest(None).await.expect("latest").is_none());
        assert!(repo.list(None, Some(5)).await.expect("list").is_empty());
    }
}
