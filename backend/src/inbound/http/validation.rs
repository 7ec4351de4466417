//! Shared validation helpers for inbound HTTP adapters.
//!
//! Query parameters arrive as optional strings and are parsed here so every
//! failure carries the same `{field, value, code}` details.

use std::str::FromStr;

use serde_json::json;

use crate::domain::{Error, Role, RouteRange, UserId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidId,
    InvalidInteger,
    InvalidBoolean,
    InvalidRole,
    InvalidRange,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidId => "invalid_id",
            ErrorCode::InvalidInteger => "invalid_integer",
            ErrorCode::InvalidBoolean => "invalid_boolean",
            ErrorCode::InvalidRole => "invalid_role",
            ErrorCode::InvalidRange => "invalid_range",
        }
    }
}

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) const USER_ID: FieldName = FieldName::new("userId");
pub(crate) const LIMIT: FieldName = FieldName::new("limit");
pub(crate) const PAGE: FieldName = FieldName::new("page");
pub(crate) const RANGE: FieldName = FieldName::new("range");
pub(crate) const ROLE: FieldName = FieldName::new("role");
pub(crate) const IS_ACTIVE: FieldName = FieldName::new("isActive");

fn invalid_value(field: FieldName, code: ErrorCode, message: String, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

/// Treat absent and blank parameters alike.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|raw| !raw.is_empty())
}

pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|raw| UserId::new(raw).ok())
        .ok_or_else(|| {
            invalid_value(
                field,
                ErrorCode::InvalidId,
                format!("{} must be a positive integer", field.as_str()),
                value,
            )
        })
}

pub(crate) fn parse_optional_user_id(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<UserId>, Error> {
    present(value)
        .map(|raw| parse_user_id(raw, field))
        .transpose()
}

pub(crate) fn parse_optional_integer<T: FromStr>(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<T>, Error> {
    present(value)
        .map(|raw| {
            raw.parse::<T>().map_err(|_| {
                invalid_value(
                    field,
                    ErrorCode::InvalidInteger,
                    format!("{} must be an integer", field.as_str()),
                    raw,
                )
            })
        })
        .transpose()
}

pub(crate) fn parse_optional_bool(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<bool>, Error> {
    present(value)
        .map(|raw| match raw {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(invalid_value(
                field,
                ErrorCode::InvalidBoolean,
                format!("{} must be true or false", field.as_str()),
                other,
            )),
        })
        .transpose()
}

pub(crate) fn parse_optional_role(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<Role>, Error> {
    present(value)
        .map(|raw| {
            Role::from_str(raw).map_err(|_| {
                invalid_value(
                    field,
                    ErrorCode::InvalidRole,
                    format!("{} must be one of user, admin, super_admin", field.as_str()),
                    raw,
                )
            })
        })
        .transpose()
}

/// Parse a route range, defaulting to the last 24 hours.
pub(crate) fn parse_route_range(value: Option<&str>, field: FieldName) -> Result<RouteRange, Error> {
    match present(value) {
        None => Ok(RouteRange::default()),
        Some(raw) => RouteRange::from_str(raw).map_err(|err| {
            invalid_value(field, ErrorCode::InvalidRange, err.to_string(), raw)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;

    fn detail<'a>(err: &'a Error, key: &str) -> Option<&'a str> {
        err.details()
            .and_then(|details| details.get(key))
            .and_then(serde_json::Value::as_str)
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some(" 12 "), Some(12))]
    fn optional_user_ids(#[case] raw: Option<&str>, #[case] expected: Option<i64>) {
        let parsed = parse_optional_user_id(raw, USER_ID).expect("valid");
        assert_eq!(parsed.map(UserId::get), expected);
    }

    #[rstest]
    #[case("abc")]
    #[case("0")]
    #[case("-4")]
    fn rejects_bad_user_ids(#[case] raw: &str) {
        let err = parse_user_id(raw, USER_ID).expect_err("invalid");
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(detail(&err, "field"), Some("userId"));
        assert_eq!(detail(&err, "code"), Some("invalid_id"));
    }

    #[test]
    fn integers_parse_or_report_the_field() {
        assert_eq!(parse_optional_integer::<i64>(Some("50"), LIMIT), Ok(Some(50)));
        let err = parse_optional_integer::<u32>(Some("ten"), PAGE).expect_err("invalid");
        assert_eq!(detail(&err, "field"), Some("page"));
        assert_eq!(detail(&err, "value"), Some("ten"));
    }

    #[rstest]
    #[case(Some("true"), Ok(Some(true)))]
    #[case(Some("false"), Ok(Some(false)))]
    #[case(None, Ok(None))]
    fn booleans(#[case] raw: Option<&str>, #[case] expected: Result<Option<bool>, ()>) {
        assert_eq!(parse_optional_bool(raw, IS_ACTIVE).map_err(|_| ()), expected);
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let err = parse_optional_role(Some("root"), ROLE).expect_err("invalid");
        assert_eq!(detail(&err, "code"), Some("invalid_role"));
        assert_eq!(parse_optional_role(Some("admin"), ROLE), Ok(Some(Role::Admin)));
    }

    #[rstest]
    #[case(None, RouteRange::Last24Hours)]
    #[case(Some("48h"), RouteRange::Last48Hours)]
    #[case(Some("72h"), RouteRange::Last72Hours)]
    fn route_ranges(#[case] raw: Option<&str>, #[case] expected: RouteRange) {
        assert_eq!(parse_route_range(raw, RANGE), Ok(expected));
    }

    #[test]
    fn unknown_route_ranges_are_rejected() {
        let err = parse_route_range(Some("1w"), RANGE).expect_err("invalid");
        assert_eq!(detail(&err, "code"), Some("invalid_range"));
    }
}
