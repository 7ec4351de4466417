//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every REST handler from the inbound layer together
//! with the domain payloads they exchange. The WebSocket channel at `/ws` is
//! not part of the document; its frames are described in
//! `inbound::ws::messages`.
//!
//! Swagger UI serves the generated document in debug builds.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{AuthSession, UserPage, UserProfile};
use crate::domain::{ActivitySummary, Error, ErrorCode, Location, LocationSample, Role, RouteRange};
use crate::inbound::http::accounts::{
    CreateUserRequest, LoginRequest, RegisterRequest, UpdateUserRequest,
};
use crate::inbound::http::locations::{BatchEntry, LocationSubmission};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let bearer = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .description(Some("Token issued by POST /auth/login or /auth/register."))
            .build();
        components.add_security_scheme("BearerAuth", SecurityScheme::Http(bearer));
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Fleet tracker API",
        description = "Location ingest, fleet queries, roster management and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::locations::submit_location,
        crate::inbound::http::locations::list_locations,
        crate::inbound::http::locations::latest_location,
        crate::inbound::http::locations::location_history,
        crate::inbound::http::locations::location_activity,
        crate::inbound::http::locations::location_route,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::register,
        crate::inbound::http::accounts::profile,
        crate::inbound::http::accounts::list_users,
        crate::inbound::http::accounts::create_user,
        crate::inbound::http::accounts::get_user,
        crate::inbound::http::accounts::update_user,
        crate::inbound::http::accounts::delete_user,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Location,
        LocationSample,
        LocationSubmission,
        BatchEntry,
        RouteRange,
        ActivitySummary,
        Error,
        ErrorCode,
        Role,
        UserProfile,
        AuthSession,
        UserPage,
        LoginRequest,
        RegisterRequest,
        CreateUserRequest,
        UpdateUserRequest,
    )),
    tags(
        (name = "locations", description = "Sample ingest and fleet queries"),
        (name = "auth", description = "Login, registration and roster management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
