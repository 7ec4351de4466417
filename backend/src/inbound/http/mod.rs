//! HTTP inbound adapter exposing REST endpoints.

pub mod accounts;
pub mod auth;
pub mod cors;
pub mod error;
pub mod health;
pub mod locations;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

use crate::domain::Error;

/// JSON body configuration reporting malformed payloads as domain errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("malformed JSON body: {err}")).into()
    })
}

/// Path configuration reporting unparsable segments as domain errors.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| Error::invalid_request(format!("invalid path: {err}")).into())
}

/// Query configuration reporting unparsable query strings as domain errors.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("invalid query string: {err}")).into()
    })
}
