//! The event envelope flowing through the broker.
//!
//! An [`Event`] is immutable once built: its fields are private and only
//! readable through accessors, and every subscriber receives its own clone.
//! The payload is the tagged union [`EventData`], keyed by event type, so
//! consumers match on variants instead of inspecting untyped JSON.

use chrono::Utc;
use microsaas_core::topics::EVENT_EMAIL_SENT;
use microsaas_core::types::{EventId, Timestamp, UserId};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Payload of an `email_sent` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailData {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Payload of an event type without a registered shape.
///
/// Only [`EventData::decode`] builds one, so its type is never a registered
/// type name and the payload reads back exactly as it was published.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomData {
    event_type: String,
    payload: serde_json::Value,
}

impl CustomData {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

/// Typed event payload.
///
/// Event types with a registered shape get their own variant. Any other type
/// is carried as [`EventData::Other`] with its raw JSON payload, so new
/// producers do not need to extend this enum before publishing.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    EmailSent(EmailData),
    Other(CustomData),
}

impl EventData {
    /// The event type tag this payload belongs to.
    pub fn event_type(&self) -> &str {
        match self {
            EventData::EmailSent(_) => EVENT_EMAIL_SENT,
            EventData::Other(custom) => custom.event_type(),
        }
    }

    /// Encode the payload to its structured-document form.
    pub fn encode(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            EventData::EmailSent(data) => serde_json::to_value(data),
            EventData::Other(custom) => Ok(custom.payload.clone()),
        }
    }

    /// Build the payload for `event_type` using its registered decoder.
    ///
    /// This is how producers create payloads for unregistered types, and how
    /// stored payloads are read back. Fails if the payload does not have the
    /// shape its type requires.
    pub fn decode(event_type: &str, payload: serde_json::Value) -> Result<Self, serde_json::Error> {
        match event_type {
            EVENT_EMAIL_SENT => Ok(EventData::EmailSent(serde_json::from_value(payload)?)),
            other => Ok(EventData::Other(CustomData {
                event_type: other.to_string(),
                payload,
            })),
        }
    }
}

impl Serialize for EventData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EventData::EmailSent(data) => data.serialize(serializer),
            EventData::Other(custom) => custom.payload.serialize(serializer),
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A business event, published once and fanned out to topic subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: EventId,
    time: Timestamp,
    user: Option<UserId>,
    data: EventData,
}

impl Event {
    /// Create a new event with a fresh id, stamped with the current time.
    pub fn new(data: EventData) -> Self {
        Self {
            id: Uuid::new_v4(),
            time: Utc::now(),
            user: None,
            data,
        }
    }

    /// Rebuild an event from its stored parts.
    pub fn restore(id: EventId, time: Timestamp, user: Option<UserId>, data: EventData) -> Self {
        Self {
            id,
            time,
            user,
            data,
        }
    }

    /// Attach the user this event concerns.
    pub fn with_user(mut self, user: Option<UserId>) -> Self {
        self.user = user;
        self
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn event_type(&self) -> &str {
        self.data.event_type()
    }

    pub fn time(&self) -> Timestamp {
        self.time
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Event", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", self.event_type())?;
        state.serialize_field("time", &self.time)?;
        state.serialize_field("data", &self.data)?;
        state.serialize_field("user", &self.user)?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
