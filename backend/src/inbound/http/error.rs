//! Rendering of domain [`Error`]s as HTTP responses.
//!
//! Every failure leaves as the JSON error envelope with the status below.
//! Internal failures are logged in full and sent to clients with a generic
//! message; the same view is reused for WebSocket acknowledgements.

use std::borrow::Cow;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::{error, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

pub use crate::domain::ApiResult;

const INTERNAL_MESSAGE: &str = "Internal server error";

const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The error as a client may see it.
///
/// Internal errors keep only their trace id; everything else is shown as is.
pub(crate) fn public_view(error: &Error) -> Cow<'_, Error> {
    if error.code() != ErrorCode::InternalError {
        return Cow::Borrowed(error);
    }
    let generic = Error::internal(INTERNAL_MESSAGE);
    Cow::Owned(match error.trace_id() {
        Some(id) => generic.with_trace_id(id.to_owned()),
        None => generic,
    })
}

fn log_server_side(error: &Error) {
    match error.code() {
        ErrorCode::InternalError => error!(
            message = error.message(),
            details = ?error.details(),
            trace_id = ?error.trace_id(),
            "request failed"
        ),
        ErrorCode::ServiceUnavailable => warn!(
            message = error.message(),
            trace_id = ?error.trace_id(),
            "dependency unavailable"
        ),
        _ => {}
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        log_server_side(self);
        let mut response = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        response.json(public_view(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "framework error surfaced as internal error");
        Self::internal(INTERNAL_MESSAGE)
    }
}

#[cfg(test)]
mod tests;
