//! Shared wiring for tests that drive the real services over the in-memory
//! store: HTTP handlers, the `/ws` endpoint and one tracking hub.

use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use async_trait::async_trait;
use chrono::TimeDelta;
use mockable::DefaultClock;

use fleet_tracker::Trace;
use fleet_tracker::domain::ports::ReverseGeocoder;
use fleet_tracker::domain::{AccountService, Coordinates, LocationIngestService, LocationQueryService};
use fleet_tracker::inbound::http::state::HttpState;
use fleet_tracker::inbound::http::{
    accounts, cors, json_config, locations, path_config, query_config,
};
use fleet_tracker::inbound::ws::{self, AllowedOrigins, TrackingHub, WsState};
use fleet_tracker::outbound::memory::InMemoryStore;
use fleet_tracker::outbound::security::{Argon2PasswordHasher, JwtTokenService, TokenSecret};

pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const RIVOLI: &str = "10 Rue de Rivoli, Paris, France";

/// Geocoder answering one fixed address for every coordinate.
pub struct FixedGeocoder(pub &'static str);

#[async_trait]
impl ReverseGeocoder for FixedGeocoder {
    async fn resolve(&self, _coordinates: Coordinates) -> Option<String> {
        Some(self.0.to_owned())
    }
}

/// Both adapter states plus the hub they share.
#[derive(Clone)]
pub struct Stack {
    pub http: HttpState,
    pub ws: WsState,
    pub hub: Arc<TrackingHub>,
    pub origins: AllowedOrigins,
}

pub fn stack() -> Stack {
    let clock = Arc::new(DefaultClock);
    let store = Arc::new(InMemoryStore::new(clock.clone()));
    let tokens = Arc::new(JwtTokenService::new(
        &TokenSecret::new(b"integration-secret".to_vec()),
        TimeDelta::hours(1),
        clock.clone(),
    ));
    let accounts = Arc::new(AccountService::new(
        store.clone(),
        Arc::new(Argon2PasswordHasher),
        tokens,
    ));
    let ingest = Arc::new(LocationIngestService::new(
        store.clone(),
        Arc::new(FixedGeocoder(RIVOLI)),
    ));
    let queries = Arc::new(LocationQueryService::new(store.clone(), store, clock));
    let hub = Arc::new(TrackingHub::new());
    let origins: AllowedOrigins = ALLOWED_ORIGIN.parse().expect("valid origins");

    Stack {
        http: HttpState::new(accounts.clone(), ingest.clone(), queries, hub.clone()),
        ws: WsState::new(accounts, ingest, hub.clone(), origins.clone()),
        hub,
        origins,
    }
}

/// Serve the full REST and socket surface on an ephemeral port.
pub fn start_server(stack: &Stack) -> (String, Server) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let http = web::Data::new(stack.http.clone());
    let ws_state = web::Data::new(stack.ws.clone());
    let origins = stack.origins.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(http.clone())
            .app_data(ws_state.clone())
            .app_data(json_config())
            .app_data(path_config())
            .app_data(query_config())
            .wrap(Trace)
            .service(ws::ws_entry)
            .service(
                web::scope("")
                    .wrap(cors::cors(&origins))
                    .configure(locations::configure)
                    .configure(accounts::configure),
            )
    })
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .run();
    (format!("http://{addr}"), server)
}
