//! Cross-origin policy for the REST routes.
//!
//! The dashboard is served from another origin, so browsers preflight every
//! authenticated call. Origins come from the same allow-list the socket
//! upgrade checks.

use actix_cors::Cors;
use actix_web::dev::RequestHead;
use actix_web::http::header::HeaderValue;
use url::Url;

use crate::domain::TRACE_ID_HEADER;
use crate::inbound::ws::AllowedOrigins;

/// How long browsers may cache a preflight answer, in seconds.
const PREFLIGHT_MAX_AGE: usize = 3600;

/// CORS middleware admitting exactly the configured origins.
///
/// Bearer tokens travel in `Authorization`, so credentials are not enabled.
/// The `trace-id` response header is exposed for client-side error reports.
pub fn cors(origins: &AllowedOrigins) -> Cors {
    let origins = origins.clone();
    Cors::default()
        .allowed_origin_fn(move |origin: &HeaderValue, _head: &RequestHead| {
            origin_allowed(&origins, origin)
        })
        .allowed_methods(["GET", "POST", "PUT", "PATCH", "DELETE"])
        .allowed_headers(["authorization", "content-type", "accept", TRACE_ID_HEADER])
        .expose_headers([TRACE_ID_HEADER])
        .max_age(PREFLIGHT_MAX_AGE)
}

fn origin_allowed(origins: &AllowedOrigins, origin: &HeaderValue) -> bool {
    origin
        .to_str()
        .ok()
        .and_then(|raw| Url::parse(raw).ok())
        .is_some_and(|url| origins.allows(&url))
}
