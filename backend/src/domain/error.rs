//! The error every driving port returns.
//!
//! [`Error`] knows nothing about transports: the HTTP adapter renders it as a
//! JSON body with a status code, the socket adapter nests it inside an
//! `update_location_ack`. Both see the same `{code, message, traceId?,
//! details?}` shape.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use super::TraceId;

/// Failure category; serialised in snake case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed input or a failed validation.
    InvalidRequest,
    /// Missing, expired or forged credentials.
    Unauthorized,
    /// Caller is known but lacks the privilege.
    Forbidden,
    NotFound,
    /// Duplicate email on registration or creation.
    Conflict,
    /// The database could not hand out a connection.
    ServiceUnavailable,
    InternalError,
}

impl ErrorCode {
    /// Message used when a caller supplies a blank one.
    const fn generic_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::ServiceUnavailable => "service unavailable",
            Self::InternalError => "internal error",
        }
    }
}

/// Categorised failure with an optional correlation id and structured
/// details.
///
/// The message is never blank. Errors built inside a [`TraceId::scope`]
/// capture that identifier automatically.
///
/// ```
/// use fleet_tracker::domain::{Error, ErrorCode};
/// use serde_json::json;
///
/// let err = Error::invalid_field("latitude", "out_of_range", "latitude must be within [-90, 90]");
/// assert_eq!(err.code(), ErrorCode::InvalidRequest);
/// assert_eq!(err.details(), Some(&json!({"field": "latitude", "code": "out_of_range"})));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "WireError", into = "WireError")]
pub struct Error {
    #[schema(example = "invalid_request")]
    code: ErrorCode,
    #[schema(example = "latitude must be within [-90, 90]")]
    message: String,
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    details: Option<Value>,
}

/// Reasons a serialised error is refused on the way back in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    #[error("error message must not be empty")]
    EmptyMessage,
    #[error("trace identifier must not be empty")]
    EmptyTraceId,
}

macro_rules! code_constructors {
    ($($name:ident => $code:ident),* $(,)?) => {
        $(
            #[doc = concat!("Error with [`ErrorCode::", stringify!($code), "`].")]
            pub fn $name(message: impl Into<String>) -> Self {
                Self::new(ErrorCode::$code, message)
            }
        )*
    };
}

impl Error {
    /// Build an error, picking up the trace id in scope.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            code.generic_message().clone_into(&mut message);
        }
        Self {
            code,
            message,
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    code_constructors! {
        invalid_request => InvalidRequest,
        unauthorized => Unauthorized,
        forbidden => Forbidden,
        not_found => NotFound,
        conflict => Conflict,
        service_unavailable => ServiceUnavailable,
        internal => InternalError,
    }

    /// Validation failure pinned to one input field.
    ///
    /// `details` becomes `{"field": field, "code": reason}`.
    pub fn invalid_field(field: &str, reason: &str, message: impl Into<String>) -> Self {
        Self::invalid_request(message).with_details(json!({ "field": field, "code": reason }))
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Replace the captured trace id.
    #[must_use]
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

/// Serde shape of [`Error`]; absent optionals are omitted.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireError {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for WireError {
    fn from(error: Error) -> Self {
        let Error {
            code,
            message,
            trace_id,
            details,
        } = error;
        Self {
            code,
            message,
            trace_id,
            details,
        }
    }
}

impl TryFrom<WireError> for Error {
    type Error = ErrorValidationError;

    fn try_from(wire: WireError) -> Result<Self, Self::Error> {
        if wire.message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        if wire.trace_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(ErrorValidationError::EmptyTraceId);
        }
        Ok(Self {
            code: wire.code,
            message: wire.message,
            trace_id: wire.trace_id,
            details: wire.details,
        })
    }
}
