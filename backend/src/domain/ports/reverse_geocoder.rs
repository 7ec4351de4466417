//! Port for resolving coordinates to a human-readable address.

use async_trait::async_trait;

use crate::domain::Coordinates;

/// Reverse geocoding lookup.
///
/// Implementations swallow every failure (transport, status, decoding,
/// timeout) and answer `None`; ingest never fails because an address could
/// not be resolved.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Resolve `coordinates` to an address, if one is available.
    async fn resolve(&self, coordinates: Coordinates) -> Option<String>;
}

/// Geocoder that never resolves anything; used when geocoding is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureReverseGeocoder;

#[async_trait]
impl ReverseGeocoder for FixtureReverseGeocoder {
    async fn resolve(&self, _coordinates: Coordinates) -> Option<String> {
        None
    }
}
