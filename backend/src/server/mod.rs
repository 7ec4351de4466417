//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_states;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use fleet_tracker::Trace;
#[cfg(debug_assertions)]
use fleet_tracker::doc::ApiDoc;
use fleet_tracker::inbound::http::health::{HealthState, live, ready};
use fleet_tracker::inbound::http::state::HttpState;
use fleet_tracker::inbound::http::{
    accounts, cors, json_config, locations, path_config, query_config,
};
use fleet_tracker::inbound::ws;
use fleet_tracker::inbound::ws::{AllowedOrigins, WsState};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    ws_state: web::Data<WsState>,
    origins: AllowedOrigins,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        origins,
    } = deps;

    // The socket upgrade checks origins itself; CORS covers the REST routes.
    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .wrap(Trace)
        .service(ws::ws_entry)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app.service(
        web::scope("")
            .wrap(cors::cors(&origins))
            .configure(locations::configure)
            .configure(accounts::configure),
    )
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is bound.
/// - `config`: pre-built [`ServerConfig`] naming the store, token secret and
///   socket origins.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when building adapters, binding the socket or
/// starting the server fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let (http_state, ws_state) = build_states(&config)?;
    let ServerConfig {
        bind_addr, origins, ..
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            ws_state: ws_state.clone(),
            origins: origins.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
