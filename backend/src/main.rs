//! Backend entry-point: loads settings, prepares the store, then serves REST,
//! WebSocket and OpenAPI endpoints.

mod server;

use std::io;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use fleet_tracker::inbound::http::health::HealthState;
use fleet_tracker::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use fleet_tracker::outbound::security::TokenSecret;
use fleet_tracker::settings::AppSettings;

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|e| io::Error::other(format!("failed to load configuration: {e}")))?;
    let config = build_server_config(&settings).await?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(host = %settings.bind_addr().0, port = settings.bind_addr().1, "listening");
    server.await
}

async fn build_server_config(settings: &AppSettings) -> io::Result<ServerConfig> {
    let origins = settings.allowed_origins().map_err(io::Error::other)?;
    let mut config = ServerConfig::new(
        settings.bind_addr(),
        token_secret(settings)?,
        settings.token_ttl(),
        origins,
    );

    if let Some(endpoint) = settings.geocoder_url().map_err(io::Error::other)? {
        info!(%endpoint, "reverse geocoding enabled");
        config = config.with_geocoder(endpoint, settings.geocoder_timeout());
    }

    match settings.database_url().map_err(io::Error::other)? {
        Some(url) => Ok(config.with_db_pool(connect_store(url, settings.db_pool_size()).await?)),
        None => Ok(config),
    }
}

/// Release builds refuse to start without a signing secret; debug builds
/// fall back to a per-process one.
fn token_secret(settings: &AppSettings) -> io::Result<TokenSecret> {
    match settings.jwt_secret() {
        Some(secret) => Ok(TokenSecret::new(secret.as_bytes())),
        None if cfg!(debug_assertions) => {
            let secret = TokenSecret::ephemeral();
            warn!(
                fingerprint = %secret.fingerprint(),
                "using temporary token secret (dev only)"
            );
            Ok(secret)
        }
        None => Err(io::Error::other(
            "TRACKER_JWT_SECRET must be set in release builds",
        )),
    }
}

async fn connect_store(database_url: String, pool_size: u32) -> io::Result<DbPool> {
    let migration_url = database_url.clone();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
        .await
        .map_err(|e| io::Error::other(format!("migration task failed: {e}")))?
        .map_err(io::Error::other)?;
    info!(applied, "database schema up to date");

    DbPool::new(PoolConfig::new(database_url).with_max_size(pool_size))
        .await
        .map_err(|e| io::Error::other(format!("failed to build database pool: {e}")))
}
