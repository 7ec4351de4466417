//! Process settings loaded via OrthoConfig.
//!
//! Every field is optional in the environment (`TRACKER_` prefix); the
//! accessors below apply the defaults so callers never see a missing value.
//! `port` carries its default in the derive, so a process started with no
//! configuration at all still loads.

use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::inbound::ws::AllowedOrigins;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_USER: &str = "gpsuser";
const DEFAULT_DB_NAME: &str = "gps_tracking";
const DEFAULT_DB_POOL_SIZE: u32 = 10;
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const DEFAULT_GEOCODER_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_ALLOWED_ORIGINS: &str =
    "http://localhost:3000,http://localhost:8080,http://frontend:3000";

/// Invalid value in an otherwise loadable configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("{field} is not a valid URL: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("cannot build a database URL from host {host:?}")]
    DatabaseHost { host: String },
}

/// Configuration for the tracking server and its companion tools.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TRACKER")]
#[serde(default)]
pub struct AppSettings {
    /// PostgreSQL host; the in-memory store is used when absent.
    #[ortho_config(cli_short = 'd')]
    pub db_host: Option<String>,
    #[ortho_config(cli_short = 'P')]
    pub db_port: Option<u16>,
    #[ortho_config(cli_short = 'u')]
    pub db_user: Option<String>,
    #[ortho_config(cli_short = 'w')]
    pub db_password: Option<String>,
    #[ortho_config(cli_short = 'n')]
    pub db_name: Option<String>,
    /// Upper bound on pooled database connections.
    #[ortho_config(cli_short = 's')]
    pub db_pool_size: Option<u32>,
    /// HS256 signing secret for bearer tokens.
    #[ortho_config(cli_short = 'j')]
    pub jwt_secret: Option<String>,
    /// Bearer token lifetime.
    #[ortho_config(cli_short = 't')]
    pub token_ttl_seconds: Option<i64>,
    /// Comma separated origins accepted on the socket upgrade.
    #[ortho_config(cli_short = 'o')]
    pub allowed_origins: Option<String>,
    #[ortho_config(default = DEFAULT_PORT, cli_short = 'p')]
    pub port: u16,
    #[ortho_config(cli_short = 'b')]
    pub bind_host: Option<String>,
    /// Nominatim-compatible reverse endpoint; an empty value disables lookups.
    #[ortho_config(cli_short = 'g')]
    pub geocoder_url: Option<String>,
    #[ortho_config(cli_short = 'T')]
    pub geocoder_timeout_ms: Option<u64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            db_host: None,
            db_port: None,
            db_user: None,
            db_password: None,
            db_name: None,
            db_pool_size: None,
            jwt_secret: None,
            token_ttl_seconds: None,
            allowed_origins: None,
            port: DEFAULT_PORT,
            bind_host: None,
            geocoder_url: None,
            geocoder_timeout_ms: None,
        }
    }
}

impl AppSettings {
    /// Host and port the HTTP listener binds to.
    pub fn bind_addr(&self) -> (String, u16) {
        (
            self.bind_host
                .clone()
                .unwrap_or_else(|| DEFAULT_BIND_HOST.to_owned()),
            self.port,
        )
    }

    /// Connection URL for PostgreSQL, or `None` when no host is configured.
    ///
    /// # Examples
    /// ```
    /// use fleet_tracker::settings::AppSettings;
    ///
    /// let settings = AppSettings {
    ///     db_host: Some("db".into()),
    ///     db_password: Some("p@ss".into()),
    ///     ..AppSettings::default()
    /// };
    /// let url = settings.database_url().expect("valid").expect("configured");
    /// assert_eq!(url, "postgres://gpsuser:p%40ss@db:5432/gps_tracking");
    /// ```
    pub fn database_url(&self) -> Result<Option<String>, SettingsError> {
        let Some(host) = self.db_host.as_deref().filter(|host| !host.trim().is_empty()) else {
            return Ok(None);
        };
        let mut url = Url::parse(&format!("postgres://{host}"))
            .map_err(|source| SettingsError::InvalidUrl {
                field: "db_host",
                source,
            })?;
        let invalid_host = || SettingsError::DatabaseHost {
            host: host.to_owned(),
        };
        url.set_username(self.db_user.as_deref().unwrap_or(DEFAULT_DB_USER))
            .map_err(|()| invalid_host())?;
        url.set_password(self.db_password.as_deref().filter(|pw| !pw.is_empty()))
            .map_err(|()| invalid_host())?;
        url.set_port(Some(self.db_port.unwrap_or(DEFAULT_DB_PORT)))
            .map_err(|()| invalid_host())?;
        url.set_path(&format!(
            "/{}",
            self.db_name.as_deref().unwrap_or(DEFAULT_DB_NAME)
        ));
        Ok(Some(url.into()))
    }

    /// Configured signing secret, ignoring blank values.
    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|secret| !secret.is_empty())
    }

    pub fn token_ttl(&self) -> TimeDelta {
        TimeDelta::seconds(self.token_ttl_seconds.unwrap_or(DEFAULT_TOKEN_TTL_SECONDS))
    }

    /// Origins accepted on the WebSocket upgrade.
    pub fn allowed_origins(&self) -> Result<AllowedOrigins, SettingsError> {
        self.allowed_origins
            .as_deref()
            .unwrap_or(DEFAULT_ALLOWED_ORIGINS)
            .parse()
            .map_err(|source| SettingsError::InvalidUrl {
                field: "allowed_origins",
                source,
            })
    }

    /// Reverse geocoder endpoint, `None` when geocoding is disabled.
    pub fn geocoder_url(&self) -> Result<Option<Url>, SettingsError> {
        let raw = self.geocoder_url.as_deref().unwrap_or(DEFAULT_GEOCODER_URL);
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Url::parse(raw)
            .map(Some)
            .map_err(|source| SettingsError::InvalidUrl {
                field: "geocoder_url",
                source,
            })
    }

    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(DEFAULT_DB_POOL_SIZE)
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_millis(
            self.geocoder_timeout_ms
                .unwrap_or(DEFAULT_GEOCODER_TIMEOUT_MS),
        )
    }
}
