//! Per-user tracking activity summaries.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Location, Role, User, UserId};

/// A user counts as tracking while their newest sample is at most this old.
pub const TRACKING_WINDOW: TimeDelta = TimeDelta::minutes(5);

/// Whether a sample taken at `latest` is recent enough at `now`.
///
/// The boundary is inclusive: a sample exactly five minutes old still counts.
///
/// # Examples
/// ```
/// use chrono::{TimeDelta, Utc};
/// use fleet_tracker::domain::is_tracking;
///
/// let now = Utc::now();
/// assert!(is_tracking(now - TimeDelta::seconds(299), now));
/// assert!(!is_tracking(now - TimeDelta::seconds(301), now));
/// ```
#[must_use]
pub fn is_tracking(latest: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    latest >= now - TRACKING_WINDOW
}

/// Activity report entry for one roster member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    /// Roster member.
    #[schema(value_type = i64)]
    pub user_id: UserId,
    /// Display name.
    pub user_name: String,
    /// Login email.
    pub user_email: String,
    /// Role.
    pub user_role: Role,
    /// Latest sample is within [`TRACKING_WINDOW`].
    pub is_tracking: bool,
    /// Timestamp of the latest sample.
    pub last_update: Option<DateTime<Utc>>,
    /// Latest sample.
    pub last_location: Option<Location>,
    /// Number of stored samples.
    pub total_locations: i64,
}

impl ActivitySummary {
    /// Combine a roster entry with its latest sample and sample count.
    #[must_use]
    pub fn new(
        user: &User,
        latest: Option<Location>,
        total_locations: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let last_update = latest.as_ref().map(|location| location.timestamp);
        Self {
            user_id: user.id,
            user_name: user.name.to_string(),
            user_email: user.email.to_string(),
            user_role: user.role,
            is_tracking: last_update.is_some_and(|timestamp| is_tracking(timestamp, now)),
            last_update,
            last_location: latest,
            total_locations,
        }
    }
}
