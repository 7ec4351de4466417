//! HTTP server configuration object and helpers.

use std::time::Duration;

use chrono::TimeDelta;
use url::Url;

use fleet_tracker::inbound::ws::AllowedOrigins;
use fleet_tracker::outbound::persistence::DbPool;
use fleet_tracker::outbound::security::TokenSecret;

/// Where reverse lookups go and how long each may take.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub(crate) endpoint: Url,
    pub(crate) timeout: Duration,
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: (String, u16),
    pub(crate) token_secret: TokenSecret,
    pub(crate) token_ttl: TimeDelta,
    pub(crate) origins: AllowedOrigins,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) geocoder: Option<GeocoderConfig>,
}

impl ServerConfig {
    /// Construct a server configuration with the in-memory store and no
    /// geocoder.
    #[must_use]
    pub fn new(
        bind_addr: (String, u16),
        token_secret: TokenSecret,
        token_ttl: TimeDelta,
        origins: AllowedOrigins,
    ) -> Self {
        Self {
            bind_addr,
            token_secret,
            token_ttl,
            origins,
            db_pool: None,
            geocoder: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// When provided, roster and samples are stored in PostgreSQL instead of
    /// process memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Enable reverse geocoding of samples submitted without an address.
    #[must_use]
    pub fn with_geocoder(mut self, endpoint: Url, timeout: Duration) -> Self {
        self.geocoder = Some(GeocoderConfig { endpoint, timeout });
        self
    }
}
