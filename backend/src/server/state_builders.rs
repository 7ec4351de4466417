//! Builders wiring adapters into the HTTP and WebSocket state bundles.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::info;

use fleet_tracker::domain::ports::{
    Accounts, FixtureReverseGeocoder, LocationIngest, LocationQuery, LocationRepository,
    ReverseGeocoder, UserRepository,
};
use fleet_tracker::domain::{AccountService, LocationIngestService, LocationQueryService};
use fleet_tracker::inbound::http::state::HttpState;
use fleet_tracker::inbound::ws::{TrackingHub, WsState};
use fleet_tracker::outbound::geocoding::NominatimGeocoder;
use fleet_tracker::outbound::memory::InMemoryStore;
use fleet_tracker::outbound::persistence::{DieselLocationRepository, DieselUserRepository};
use fleet_tracker::outbound::security::{Argon2PasswordHasher, JwtTokenService};

use super::ServerConfig;
use super::config::GeocoderConfig;

type Stores = (Arc<dyn UserRepository>, Arc<dyn LocationRepository>);

/// Select PostgreSQL repositories when a pool is configured, otherwise a
/// shared in-memory store.
fn build_stores(config: &ServerConfig, clock: Arc<dyn Clock>) -> Stores {
    let Some(pool) = &config.db_pool else {
        info!("no database configured; using the in-memory store");
        let store = Arc::new(InMemoryStore::new(clock));
        let users: Arc<dyn UserRepository> = store.clone();
        let locations: Arc<dyn LocationRepository> = store;
        return (users, locations);
    };
    let users: Arc<dyn UserRepository> = Arc::new(DieselUserRepository::new(pool.clone()));
    let locations: Arc<dyn LocationRepository> =
        Arc::new(DieselLocationRepository::new(pool.clone()));
    (users, locations)
}

fn build_geocoder(geocoder: Option<&GeocoderConfig>) -> std::io::Result<Arc<dyn ReverseGeocoder>> {
    match geocoder {
        Some(GeocoderConfig { endpoint, timeout }) => {
            let nominatim = NominatimGeocoder::new(endpoint.clone(), *timeout).map_err(|err| {
                std::io::Error::other(format!("geocoder client construction failed: {err}"))
            })?;
            Ok(Arc::new(nominatim))
        }
        None => {
            info!("reverse geocoding disabled");
            Ok(Arc::new(FixtureReverseGeocoder))
        }
    }
}

/// Driving ports shared by both inbound adapters.
struct Services {
    accounts: Arc<dyn Accounts>,
    ingest: Arc<dyn LocationIngest>,
    locations: Arc<dyn LocationQuery>,
}

fn build_services(config: &ServerConfig) -> std::io::Result<Services> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let (users, store) = build_stores(config, clock.clone());
    let geocoder = build_geocoder(config.geocoder.as_ref())?;
    let tokens = Arc::new(JwtTokenService::new(
        &config.token_secret,
        config.token_ttl,
        clock.clone(),
    ));

    Ok(Services {
        accounts: Arc::new(AccountService::new(
            users.clone(),
            Arc::new(Argon2PasswordHasher),
            tokens,
        )),
        ingest: Arc::new(LocationIngestService::new(store.clone(), geocoder)),
        locations: Arc::new(LocationQueryService::new(store, users, clock)),
    })
}

/// Build both state bundles around one process-wide [`TrackingHub`].
pub(super) fn build_states(
    config: &ServerConfig,
) -> std::io::Result<(web::Data<HttpState>, web::Data<WsState>)> {
    let Services {
        accounts,
        ingest,
        locations,
    } = build_services(config)?;
    let hub = Arc::new(TrackingHub::new());

    let http_state = HttpState::new(accounts.clone(), ingest.clone(), locations, hub.clone());
    let ws_state = WsState::new(accounts, ingest, hub, config.origins.clone());
    Ok((web::Data::new(http_state), web::Data::new(ws_state)))
}
