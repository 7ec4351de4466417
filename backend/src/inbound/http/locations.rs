//! Location API handlers.
//!
//! ```text
//! POST /locations {"latitude":48.8566,"longitude":2.3522}
//! GET /locations?userId=7
//! GET /locations/latest?userId=7
//! GET /locations/history?userId=7&limit=50
//! GET /locations/activity
//! GET /locations/route?userId=7&range=48h
//! ```
//!
//! Every persisted sample is handed to the [`LocationPublisher`] so live
//! subscribers see it; publishing never fails the request.
//!
//! [`LocationPublisher`]: crate::domain::ports::LocationPublisher

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{ActivitySummary, Error, Location, LocationSample, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    LIMIT, RANGE, USER_ID, parse_optional_integer, parse_optional_user_id, parse_route_range,
};

/// Request body for `POST /locations`: one sample or an ordered batch.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum LocationSubmission {
    Batch(Vec<LocationSample>),
    Single(LocationSample),
}

/// Outcome of one batch entry.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum BatchEntry {
    Stored(Location),
    Failed { error: Error, index: usize },
}

/// `?userId=` filter.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserFilterQuery {
    /// Owner to read; defaults to the caller.
    #[param(value_type = Option<i64>)]
    pub user_id: Option<String>,
}

/// `?userId=&limit=` filter for history reads.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    #[param(value_type = Option<i64>)]
    pub user_id: Option<String>,
    /// Maximum number of samples (default 100, capped at 1000).
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
}

/// `?userId=&range=` filter for route reads.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RouteQuery {
    #[param(value_type = Option<i64>)]
    pub user_id: Option<String>,
    /// Lookback window: `24h`, `48h` or `72h`.
    #[param(value_type = Option<String>, example = "24h")]
    pub range: Option<String>,
}

fn publish(state: &HttpState, owner: UserId, location: &Location) {
    let report = state.publisher.publish(owner, location);
    debug!(
        user_id = %owner,
        location_id = location.id,
        deliveries = report.total(),
        "published location"
    );
}

/// Submit one sample or a batch for the caller.
///
/// A batch answers with one entry per input, in order; failed entries carry
/// their error and index while the rest are persisted.
#[utoipa::path(
    post,
    path = "/locations",
    request_body = LocationSubmission,
    responses(
        (status = 201, description = "Persisted sample, or one entry per batch input", body = Location),
        (status = 400, description = "Invalid sample", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["locations"],
    operation_id = "submitLocation"
)]
#[post("/locations")]
pub async fn submit_location(
    state: web::Data<HttpState>,
    auth: AuthContext,
    payload: web::Json<LocationSubmission>,
) -> ApiResult<HttpResponse> {
    let owner = auth.actor().id;
    match payload.into_inner() {
        LocationSubmission::Single(sample) => {
            let location = state.ingest.submit(owner, sample).await?;
            publish(&state, owner, &location);
            Ok(HttpResponse::Created().json(location))
        }
        LocationSubmission::Batch(samples) => {
            let outcomes = state.ingest.submit_batch(owner, samples).await;
            let entries: Vec<BatchEntry> = outcomes
                .into_iter()
                .enumerate()
                .map(|(index, outcome)| match outcome {
                    Ok(location) => {
                        publish(&state, owner, &location);
                        BatchEntry::Stored(location)
                    }
                    Err(error) => BatchEntry::Failed { error, index },
                })
                .collect();
            Ok(HttpResponse::Created().json(entries))
        }
    }
}

/// List samples newest first.
///
/// Without `userId` the caller's own samples are listed; a plain user naming
/// anyone else gets an empty list.
#[utoipa::path(
    get,
    path = "/locations",
    params(UserFilterQuery),
    responses(
        (status = 200, description = "Samples, newest first", body = [Location]),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error)
    ),
    tags = ["locations"],
    operation_id = "listLocations"
)]
#[get("/locations")]
pub async fn list_locations(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<UserFilterQuery>,
) -> ApiResult<web::Json<Vec<Location>>> {
    let user_id = parse_optional_user_id(query.user_id.as_deref(), USER_ID)?;
    let locations = state.locations.list(auth.actor(), user_id).await?;
    Ok(web::Json(locations))
}

/// Most recent visible sample, or `null`.
///
/// Plain users always read their own, whatever `userId` says.
#[utoipa::path(
    get,
    path = "/locations/latest",
    params(UserFilterQuery),
    responses(
        (status = 200, description = "Latest sample or null", body = Option<Location>),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error)
    ),
    tags = ["locations"],
    operation_id = "latestLocation"
)]
#[get("/locations/latest")]
pub async fn latest_location(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<UserFilterQuery>,
) -> ApiResult<web::Json<Option<Location>>> {
    let user_id = parse_optional_user_id(query.user_id.as_deref(), USER_ID)?;
    let latest = state.locations.latest(auth.actor(), user_id).await?;
    Ok(web::Json(latest))
}

/// Recent samples newest first.
#[utoipa::path(
    get,
    path = "/locations/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Samples, newest first", body = [Location]),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error)
    ),
    tags = ["locations"],
    operation_id = "locationHistory"
)]
#[get("/locations/history")]
pub async fn location_history(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<HistoryQuery>,
) -> ApiResult<web::Json<Vec<Location>>> {
    let user_id = parse_optional_user_id(query.user_id.as_deref(), USER_ID)?;
    let limit = parse_optional_integer::<i64>(query.limit.as_deref(), LIMIT)?;
    let history = state.locations.history(auth.actor(), user_id, limit).await?;
    Ok(web::Json(history))
}

/// Tracking status for the caller's roster.
#[utoipa::path(
    get,
    path = "/locations/activity",
    responses(
        (status = 200, description = "Per-user tracking status", body = [ActivitySummary]),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["locations"],
    operation_id = "locationActivity"
)]
#[get("/locations/activity")]
pub async fn location_activity(
    state: web::Data<HttpState>,
    auth: AuthContext,
) -> ApiResult<web::Json<Vec<ActivitySummary>>> {
    let summaries = state.locations.activity(auth.actor()).await?;
    Ok(web::Json(summaries))
}

/// Samples oldest first inside the lookback window.
///
/// Users outside the caller's roster answer `404`, exactly like unknown ids.
/// Without `userId` the route is empty.
#[utoipa::path(
    get,
    path = "/locations/route",
    params(RouteQuery),
    responses(
        (status = 200, description = "Samples, oldest first", body = [Location]),
        (status = 400, description = "Invalid query", body = Error),
        (status = 401, description = "Missing or invalid bearer token", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["locations"],
    operation_id = "locationRoute"
)]
#[get("/locations/route")]
pub async fn location_route(
    state: web::Data<HttpState>,
    auth: AuthContext,
    query: web::Query<RouteQuery>,
) -> ApiResult<web::Json<Vec<Location>>> {
    let actor = auth.actor();
    if !actor.role.is_privileged() {
        return Err(Error::forbidden("admin role required"));
    }
    let range = parse_route_range(query.range.as_deref(), RANGE)?;
    let Some(user_id) = parse_optional_user_id(query.user_id.as_deref(), USER_ID)? else {
        return Ok(web::Json(Vec::new()));
    };
    let route = state.locations.route(actor, user_id, range).await?;
    Ok(web::Json(route))
}

/// Register every location handler on a service config.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(submit_location)
        .service(latest_location)
        .service(location_history)
        .service(location_activity)
        .service(location_route)
        .service(list_locations);
}

#[cfg(test)]
#[path = "locations_tests.rs"]
mod tests;
