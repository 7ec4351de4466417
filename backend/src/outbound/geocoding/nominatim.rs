//! Reqwest-backed Nominatim reverse geocoder.
//!
//! Every failure degrades to `None` with a warning: ingest must not depend on
//! the geocoder being reachable.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use super::dto::ReverseResponseDto;
use crate::domain::Coordinates;
use crate::domain::ports::ReverseGeocoder;

/// Nominatim's usage policy requires an identifying user-agent.
const USER_AGENT: &str = "GPS-Tracking-App/1.0";
const ZOOM: &str = "18";

/// Reverse geocoder issuing `GET {endpoint}?format=json&lat=..&lon=..`.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: Url,
}

impl NominatimGeocoder {
    /// Build a geocoder with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, endpoint })
    }

    fn lookup_url(&self, coordinates: Coordinates) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &coordinates.latitude().to_string())
            .append_pair("lon", &coordinates.longitude().to_string())
            .append_pair("zoom", ZOOM)
            .append_pair("addressdetails", "1");
        url
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn resolve(&self, coordinates: Coordinates) -> Option<String> {
        let response = self
            .client
            .get(self.lookup_url(coordinates))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .inspect_err(|error| {
                warn!(timeout = error.is_timeout(), %error, "reverse geocoding request failed");
            })
            .ok()?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "reverse geocoding returned an error status");
            return None;
        }

        let body = response
            .bytes()
            .await
            .inspect_err(|error| warn!(%error, "reverse geocoding body could not be read"))
            .ok()?;
        let address = parse_address(body.as_ref());
        debug!(resolved = address.is_some(), "reverse geocoding finished");
        address
    }
}

fn parse_address(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ReverseResponseDto>(body)
        .inspect_err(|error| warn!(%error, "reverse geocoding payload was not valid JSON"))
        .ok()?
        .into_address()
}
