//! WebSocket inbound adapter for live location tracking.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, bearer token)
//! - spawn the per-connection session loop
//! - own the [`TrackingHub`] fan-out shared with the HTTP adapter

use actix_web::http::header::{HeaderValue, ORIGIN};
use actix_web::{HttpRequest, HttpResponse, get, web};
use serde::Deserialize;
use tracing::{Instrument, error, info_span, warn};
use url::Url;

use crate::domain::{Actor, Error};
use crate::inbound::http::auth::bearer_token;

mod hub;
mod origins;
mod registry;
mod session;

pub mod messages;
pub mod state;

pub use hub::TrackingHub;
pub use origins::AllowedOrigins;
pub use registry::{ChannelId, SubscriptionRegistry};
pub use state::WsState;

/// Browsers cannot set headers on WebSocket upgrades, so the token may also
/// travel as `?token=`.
#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    req: HttpRequest,
    stream: web::Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        warn!("missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        warn!("multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(&state.origins, origin_header)?;

    let actor = authenticate(&state, &req).await?;
    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;

    let span = info_span!("ws_session", user_id = %actor.id);
    actix_web::rt::spawn(
        session::handle_ws_session(state.get_ref().clone(), actor, session, messages)
            .instrument(span),
    );
    Ok(response)
}

async fn authenticate(state: &WsState, req: &HttpRequest) -> Result<Actor, Error> {
    let from_query = web::Query::<TokenQuery>::from_query(req.query_string())
        .ok()
        .and_then(|query| query.into_inner().token)
        .filter(|token| !token.trim().is_empty());
    let token = from_query
        .or_else(|| bearer_token(req.headers()).map(str::to_owned))
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    state.accounts.authenticate(&token).await
}

fn validate_origin(allowed: &AllowedOrigins, origin_header: &HeaderValue) -> actix_web::Result<()> {
    let origin_value = origin_header.to_str().map_err(|error| {
        warn!(error = %error, "Origin header is not valid UTF-8");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;
    let origin = Url::parse(origin_value).map_err(|error| {
        warn!(error = %error, "Origin header is not a URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if allowed.allows(&origin) {
        Ok(())
    } else {
        warn!(origin = origin_value, "rejected WebSocket upgrade from disallowed Origin");
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
