//! Core data models for live position sync.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::HashMap;

/// Inbound event carrying a position update.
pub const EVENT_UPDATE_LOCATION: &str = "update_location";
/// Outbound event reporting a rejected update to one connection.
pub const EVENT_ERROR: &str = "error";
/// Outbound event carrying every known position.
pub const EVENT_USER_LOCATION_UPDATE: &str = "userLocationUpdate";

/// Last-known position of one authenticated user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Server time at which the update was accepted
    pub observed_at: DateTime<Utc>,
}

impl PositionRecord {
    pub fn new(
        user_id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            latitude,
            longitude,
            observed_at,
        }
    }
}

/// Wire shape of one entry in a `userLocationUpdate` broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationBroadcast {
    pub user_id: String,
    /// `[latitude, longitude]`
    pub position: [f64; 2],
    /// RFC 3339 / ISO-8601, UTC
    pub timestamp: String,
}

impl From<&PositionRecord> for LocationBroadcast {
    fn from(record: &PositionRecord) -> Self {
        Self {
            user_id: record.user_id.clone(),
            position: [record.latitude, record.longitude],
            timestamp: record
                .observed_at
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Body of an `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Events the server emits over the stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "error")]
    Error(ErrorPayload),
    #[serde(rename = "userLocationUpdate")]
    UserLocationUpdate(Vec<LocationBroadcast>),
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }

    /// Build a broadcast from a set of records, ordered by user ID.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a PositionRecord>,
    {
        let mut entries: Vec<LocationBroadcast> =
            records.into_iter().map(LocationBroadcast::from).collect();
        entries.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Self::UserLocationUpdate(entries)
    }
}

/// Envelope of every text frame sent by a client: `{"event": ..., "data": ...}`.
///
/// The payload stays untyped so a malformed update can still be answered
/// with the proper `error` event instead of being dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl ClientFrame {
    pub fn update_location(update: &LocationUpdate) -> Self {
        Self {
            event: EVENT_UPDATE_LOCATION.to_string(),
            data: serde_json::json!({
                "token": update.token,
                "latitude": update.latitude,
                "longitude": update.longitude,
            }),
        }
    }
}

/// Fields of an `update_location` payload. Any of them may be absent or
/// carry the wrong JSON type; those arrive as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationUpdate {
    pub token: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationUpdate {
    pub fn new(token: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            token: Some(token.into()),
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// Extract the update fields from a raw payload.
    pub fn from_value(data: &Value) -> Self {
        Self {
            token: data
                .get("token")
                .and_then(Value::as_str)
                .map(str::to_string),
            latitude: data.get("latitude").and_then(Value::as_f64),
            longitude: data.get("longitude").and_then(Value::as_f64),
        }
    }

    /// Extract the update fields from unparsed payload text. Each field is
    /// decoded on its own, so a coordinate that does not fit an `f64`
    /// (`1e400`) only loses that field.
    pub fn from_raw(data: &RawValue) -> Self {
        let Ok(fields) = serde_json::from_str::<HashMap<String, &RawValue>>(data.get()) else {
            return Self::default();
        };
        let field = |name: &str| fields.get(name).map(|raw| raw.get());

        Self {
            token: field("token").and_then(|raw| serde_json::from_str(raw).ok()),
            latitude: field("latitude").and_then(|raw| serde_json::from_str(raw).ok()),
            longitude: field("longitude").and_then(|raw| serde_json::from_str(raw).ok()),
        }
    }
}

/// Inbound frame as read off the socket. Only the envelope is parsed here;
/// the payload is decoded per event.
#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    pub event: String,
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

impl InboundFrame {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Fields of an `update_location` payload; all `None` when it is absent.
    pub fn location_update(&self) -> LocationUpdate {
        self.data
            .as_deref()
            .map(LocationUpdate::from_raw)
            .unwrap_or_default()
    }
}
