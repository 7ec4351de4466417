//! Location ingest use case.
//!
//! Validates samples, fills in a reverse-geocoded address when the caller
//! omitted one, and persists the result. Geocoding is best effort: the
//! geocoder port cannot fail, so a missing address never blocks a write.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::domain::ports::{
    LocationIngest, LocationRepository, LocationRepositoryError, ReverseGeocoder,
};
use crate::domain::{Error, Location, LocationSample, LocationValidationError, UserId};

/// Ingest service implementing [`LocationIngest`].
pub struct LocationIngestService<L: ?Sized, G: ?Sized> {
    locations: Arc<L>,
    geocoder: Arc<G>,
}

impl<L: ?Sized, G: ?Sized> LocationIngestService<L, G> {
    /// Create a new service over a location store and a geocoder.
    pub fn new(locations: Arc<L>, geocoder: Arc<G>) -> Self {
        Self {
            locations,
            geocoder,
        }
    }
}

impl<L, G> LocationIngestService<L, G>
where
    L: LocationRepository + ?Sized,
    G: ReverseGeocoder + ?Sized,
{
    fn map_repository_error(error: LocationRepositoryError) -> Error {
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

    fn validation_error(error: LocationValidationError, index: Option<usize>) -> Error {
        let mut details = Map::new();
        details.insert("field".to_owned(), json!(error.field()));
        details.insert("code".to_owned(), json!(error.code()));
        if let Some(index) = index {
            details.insert("index".to_owned(), json!(index));
        }
        Error::invalid_request(error.to_string()).with_details(Value::Object(details))
    }

    async fn persist(
        &self,
        owner: UserId,
        sample: &LocationSample,
        index: Option<usize>,
    ) -> Result<Location, Error> {
        let draft = sample
            .validate()
            .map_err(|err| Self::validation_error(err, index))?;
        let resolved = if draft.address.is_none() {
            self.geocoder.resolve(draft.coordinates).await
        } else {
            None
        };
        let record = draft.into_new_location(owner, resolved);
        let location = self
            .locations
            .insert(&record)
            .await
            .map_err(Self::map_repository_error)?;
        debug!(
            user_id = %owner,
            location_id = location.id,
            has_address = location.address.is_some(),
            "location persisted"
        );
        Ok(location)
    }
}

#[async_trait]
impl<L, G> LocationIngest for LocationIngestService<L, G>
where
    L: LocationRepository + ?Sized,
    G: ReverseGeocoder + ?Sized,
{
    async fn submit(&self, owner: UserId, sample: LocationSample) -> Result<Location, Error> {
        self.persist(owner, &sample, None).await
    }

    async fn submit_batch(
        &self,
        owner: UserId,
        samples: Vec<LocationSample>,
    ) -> Vec<Result<Location, Error>> {
        let mut results = Vec::with_capacity(samples.len());
        for (index, sample) in samples.iter().enumerate() {
            results.push(self.persist(owner, sample, Some(index)).await);
        }
        results
    }
}

#[cfg(test)]
#[path = "location_ingest_service_tests.rs"]
mod tests;
