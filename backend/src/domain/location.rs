//! Location samples and the values derived from them.
//!
//! Coordinates keep 8 fractional digits, speed and heading keep 2; values are
//! rounded on validation so every adapter stores and returns the same number.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

const COORDINATE_SCALE: f64 = 100_000_000.0;
const MEASUREMENT_SCALE: f64 = 100.0;
/// Largest speed or heading representable with 5 digits and scale 2.
pub const MEASUREMENT_MAX: f64 = 999.99;
/// Maximum stored address length.
pub const ADDRESS_MAX: usize = 500;

/// Validation failures for incoming samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationValidationError {
    /// Latitude was missing.
    #[error("latitude is required")]
    MissingLatitude,
    /// Longitude was missing.
    #[error("longitude is required")]
    MissingLongitude,
    /// Latitude was not finite or outside [-90, 90].
    #[error("latitude must be within [-90, 90]")]
    LatitudeOutOfRange,
    /// Longitude was not finite or outside [-180, 180].
    #[error("longitude must be within [-180, 180]")]
    LongitudeOutOfRange,
    /// Speed was negative, not finite, or too large.
    #[error("speed must be a finite value within [0, 999.99]")]
    InvalidSpeed,
    /// Heading was outside [0, 360].
    #[error("heading must be within [0, 360]")]
    InvalidHeading,
    /// Address exceeded [`ADDRESS_MAX`].
    #[error("address must be at most 500 characters")]
    AddressTooLong,
}

impl LocationValidationError {
    /// Request field the failure refers to.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::MissingLatitude | Self::LatitudeOutOfRange => "latitude",
            Self::MissingLongitude | Self::LongitudeOutOfRange => "longitude",
            Self::InvalidSpeed => "speed",
            Self::InvalidHeading => "heading",
            Self::AddressTooLong => "address",
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingLatitude | Self::MissingLongitude => "missing_field",
            Self::LatitudeOutOfRange | Self::LongitudeOutOfRange => "out_of_range",
            Self::InvalidSpeed => "invalid_speed",
            Self::InvalidHeading => "invalid_heading",
            Self::AddressTooLong => "too_long",
        }
    }
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}

/// Validated WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate and round a latitude/longitude pair.
    ///
    /// # Examples
    /// ```
    /// use fleet_tracker::domain::Coordinates;
    ///
    /// let paris = Coordinates::new(48.8566, 2.3522).unwrap();
    /// assert_eq!(paris.latitude(), 48.8566);
    /// assert!(Coordinates::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(LocationValidationError::LatitudeOutOfRange);
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationValidationError::LongitudeOutOfRange);
        }
        Ok(Self {
            latitude: round_to(latitude, COORDINATE_SCALE),
            longitude: round_to(longitude, COORDINATE_SCALE),
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Raw sample as submitted by a device, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    /// Latitude in degrees.
    #[serde(alias = "lat")]
    #[schema(example = 48.8566)]
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    #[serde(alias = "lng", alias = "lon")]
    #[schema(example = 2.3522)]
    pub longitude: Option<f64>,
    /// Ground speed.
    pub speed: Option<f64>,
    /// Bearing in degrees.
    pub heading: Option<f64>,
    /// Caller-supplied address; skips reverse geocoding when present.
    pub address: Option<String>,
}

impl LocationSample {
    /// Validate the sample into a draft ready for address resolution.
    pub fn validate(&self) -> Result<LocationDraft, LocationValidationError> {
        let latitude = self
            .latitude
            .ok_or(LocationValidationError::MissingLatitude)?;
        let longitude = self
            .longitude
            .ok_or(LocationValidationError::MissingLongitude)?;
        let coordinates = Coordinates::new(latitude, longitude)?;
        let speed = self.speed.map(validate_speed).transpose()?;
        let heading = self.heading.map(validate_heading).transpose()?;
        let address = normalise_address(self.address.as_deref())?;
        Ok(LocationDraft {
            coordinates,
            speed,
            heading,
            address,
        })
    }
}

fn validate_speed(speed: f64) -> Result<f64, LocationValidationError> {
    if !speed.is_finite() || !(0.0..=MEASUREMENT_MAX).contains(&speed) {
        return Err(LocationValidationError::InvalidSpeed);
    }
    Ok(round_to(speed, MEASUREMENT_SCALE))
}

fn validate_heading(heading: f64) -> Result<f64, LocationValidationError> {
    if !heading.is_finite() || !(0.0..=360.0).contains(&heading) {
        return Err(LocationValidationError::InvalidHeading);
    }
    Ok(round_to(heading, MEASUREMENT_SCALE))
}

fn normalise_address(address: Option<&str>) -> Result<Option<String>, LocationValidationError> {
    let Some(trimmed) = address.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > ADDRESS_MAX {
        return Err(LocationValidationError::AddressTooLong);
    }
    Ok(Some(trimmed.to_owned()))
}

/// Validated sample awaiting an optional address lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationDraft {
    /// Position.
    pub coordinates: Coordinates,
    /// Rounded ground speed.
    pub speed: Option<f64>,
    /// Rounded bearing.
    pub heading: Option<f64>,
    /// Caller-supplied address, blank values removed.
    pub address: Option<String>,
}

impl LocationDraft {
    /// Attach an owner and a resolved address, producing an insertable record.
    #[must_use]
    pub fn into_new_location(self, user_id: UserId, resolved: Option<String>) -> NewLocation {
        NewLocation {
            user_id,
            coordinates: self.coordinates,
            speed: self.speed,
            heading: self.heading,
            address: self.address.or(resolved),
        }
    }
}

/// Record handed to the location store; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    /// Owner.
    pub user_id: UserId,
    /// Position.
    pub coordinates: Coordinates,
    /// Ground speed.
    pub speed: Option<f64>,
    /// Bearing.
    pub heading: Option<f64>,
    /// Human-readable address.
    pub address: Option<String>,
}

/// Persisted, immutable location sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Store-assigned identifier.
    pub id: i64,
    /// Owner.
    #[schema(value_type = i64)]
    pub user_id: UserId,
    /// Latitude in degrees, 8 fractional digits.
    pub latitude: f64,
    /// Longitude in degrees, 8 fractional digits.
    pub longitude: f64,
    /// Ground speed, 2 fractional digits.
    pub speed: Option<f64>,
    /// Bearing, 2 fractional digits.
    pub heading: Option<f64>,
    /// Resolved or caller-supplied address.
    pub address: Option<String>,
    /// Server-assigned creation time.
    pub timestamp: DateTime<Utc>,
}

/// Lookback window for route queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RouteRange {
    /// Last 24 hours.
    #[default]
    #[serde(rename = "24h")]
    Last24Hours,
    /// Last 48 hours.
    #[serde(rename = "48h")]
    Last48Hours,
    /// Last 72 hours.
    #[serde(rename = "72h")]
    Last72Hours,
}

/// Unknown route range string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("range must be one of 24h, 48h, 72h")]
pub struct RouteRangeParseError;

impl RouteRange {
    /// Window length.
    #[must_use]
    pub const fn lookback(self) -> TimeDelta {
        match self {
            Self::Last24Hours => TimeDelta::hours(24),
            Self::Last48Hours => TimeDelta::hours(48),
            Self::Last72Hours => TimeDelta::hours(72),
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Last24Hours => "24h",
            Self::Last48Hours => "48h",
            Self::Last72Hours => "72h",
        }
    }
}

impl FromStr for RouteRange {
    type Err = RouteRangeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "24h" => Ok(Self::Last24Hours),
            "48h" => Ok(Self::Last48Hours),
            "72h" => Ok(Self::Last72Hours),
            _ => Err(RouteRangeParseError),
        }
    }
}

impl fmt::Display for RouteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
