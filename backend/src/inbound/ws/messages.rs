//! Wire-level message definitions for the WebSocket adapter.
//!
//! Every frame is a JSON text message shaped `{"event": <name>, "data": ...}`.
//! Client frames are parsed in two steps so an unknown event name can be
//! told apart from a malformed payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Error, Location, LocationSample, UserId};

/// Raw envelope; `data` defaults to `null` when omitted.
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// `join_tracking` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTracking {
    pub user_id: UserId,
}

/// `update_location` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocation {
    pub user_id: UserId,
    pub location: LocationSample,
}

/// Events a client may send.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    JoinTracking(JoinTracking),
    LeaveTracking,
    UpdateLocation(UpdateLocation),
    /// A well-formed envelope naming an event this server does not handle.
    Unknown(String),
}

/// Frame that is not a valid envelope, or a known event with a bad payload.
#[derive(Debug, thiserror::Error)]
#[error("malformed {context}: {source}")]
pub struct MalformedFrame {
    context: &'static str,
    #[source]
    source: serde_json::Error,
}

fn malformed(context: &'static str) -> impl FnOnce(serde_json::Error) -> MalformedFrame {
    move |source| MalformedFrame { context, source }
}

impl ClientEvent {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, MalformedFrame> {
        let envelope: Envelope = serde_json::from_str(text).map_err(malformed("envelope"))?;
        match envelope.event.as_str() {
            "join_tracking" => serde_json::from_value(envelope.data)
                .map(Self::JoinTracking)
                .map_err(malformed("join_tracking payload")),
            "leave_tracking" => Ok(Self::LeaveTracking),
            "update_location" => serde_json::from_value(envelope.data)
                .map(Self::UpdateLocation)
                .map_err(malformed("update_location payload")),
            _ => Ok(Self::Unknown(envelope.event)),
        }
    }
}

/// `location_updated` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdated {
    pub user_id: UserId,
    pub location: Location,
}

/// Reply to `update_location`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateLocationAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
}

impl UpdateLocationAck {
    pub fn accepted(location: Location) -> Self {
        Self {
            success: true,
            location: Some(location),
            error: None,
        }
    }

    pub fn rejected(error: Error) -> Self {
        Self {
            success: false,
            location: None,
            error: Some(error),
        }
    }
}

/// Events the server emits.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    LocationUpdated(LocationUpdated),
    UpdateLocationAck(UpdateLocationAck),
}
