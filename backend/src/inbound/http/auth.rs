//! Bearer-token authentication for HTTP handlers.
//!
//! [`AuthContext`] is an extractor: handlers that take it reject requests
//! without a valid `Authorization: Bearer <token>` header with `401` before
//! their body runs.

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Actor, Error};
use crate::inbound::http::state::HttpState;

const BEARER_SCHEME: &str = "bearer";

/// Extract the token from an `Authorization: Bearer` header.
///
/// The scheme is matched case-insensitively; blank tokens count as absent.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty()).then_some(token)
}

/// Authenticated caller resolved from the bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext(Actor);

impl AuthContext {
    pub fn actor(&self) -> Actor {
        self.0
    }
}

impl FromRequest for AuthContext {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req.headers()).map(str::to_owned);
        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let token = token.ok_or_else(|| Error::unauthorized("missing bearer token"))?;
            let actor = state.accounts.authenticate(&token).await?;
            Ok(Self(actor))
        })
    }
}
