//! Driving port for accepting location samples.
//!
//! Inbound adapters (HTTP and WebSocket) call this port to validate, geocode
//! and persist samples. Broadcasting the result is left to the caller.

use async_trait::async_trait;

use crate::domain::{Error, Location, LocationSample, UserId};

/// Validate and persist location samples for an owner.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationIngest: Send + Sync {
    /// Persist one sample, resolving its address when the caller left it out.
    async fn submit(&self, owner: UserId, sample: LocationSample) -> Result<Location, Error>;

    /// Persist samples in order. Each entry succeeds or fails on its own; a
    /// failed entry never rolls back earlier ones. Validation failures carry
    /// the entry's `index` in their details.
    async fn submit_batch(
        &self,
        owner: UserId,
        samples: Vec<LocationSample>,
    ) -> Vec<Result<Location, Error>>;
}
