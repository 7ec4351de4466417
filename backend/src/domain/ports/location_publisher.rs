//! Port for fanning persisted samples out to live subscribers.

use serde::Serialize;

use crate::domain::{Location, UserId};

/// Deliveries handed to open channels by one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Channels following the owner.
    pub room: usize,
    /// Every other open channel.
    pub global: usize,
}

impl PublishReport {
    /// Total deliveries.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.room + self.global
    }
}

/// Best-effort broadcast of a persisted sample.
///
/// `publish` enqueues without waiting for any socket write; a channel that
/// closed in the meantime is skipped silently.
#[cfg_attr(test, mockall::automock)]
pub trait LocationPublisher: Send + Sync {
    /// Emit `location` as a `location_updated` event owned by `owner`.
    fn publish(&self, owner: UserId, location: &Location) -> PublishReport;
}

/// Publisher with no subscribers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLocationPublisher;

impl LocationPublisher for FixtureLocationPublisher {
    fn publish(&self, _owner: UserId, _location: &Location) -> PublishReport {
        PublishReport::default()
    }
}
