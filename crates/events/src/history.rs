//! Durable per-user event history.
//!
//! [`HistoryWriter`] subscribes to the `history` topic and persists every
//! event through a [`HistoryStore`]. A failed write is logged and the event
//! is lost from history; the writer keeps consuming.

use std::sync::Arc;

use async_trait::async_trait;
use microsaas_core::topics::HISTORY_TOPIC;
use microsaas_core::types::UserId;
use microsaas_db::models::history_event::{CreateHistoryEvent, HistoryEventRow};
use microsaas_db::repositories::HistoryEventRepo;
use microsaas_db::DbPool;
use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::consumer::{ConsumerHandle, EventHandler, HandlerError, TopicConsumer};
use crate::event::{Event, EventData};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("History storage error: {0}")]
    Database(#[from] sqlx::Error),

    /// A payload could not be encoded for storage or decoded on read.
    #[error("History payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// HistoryStore
// ---------------------------------------------------------------------------

/// Storage collaborator for the history pipeline.
#[async_trait]
pub trait HistoryStore: Send + Sync + 'static {
    async fn store(&self, event: &Event) -> Result<(), HistoryError>;

    /// The user's most recent events, newest first, at most `limit`.
    async fn list(&self, user: UserId, limit: i64) -> Result<Vec<Event>, HistoryError>;
}

#[async_trait]
impl<S: HistoryStore + ?Sized> HistoryStore for Arc<S> {
    async fn store(&self, event: &Event) -> Result<(), HistoryError> {
        (**self).store(event).await
    }

    async fn list(&self, user: UserId, limit: i64) -> Result<Vec<Event>, HistoryError> {
        (**self).list(user, limit).await
    }
}

/// Encode an event into its `history_events` row.
pub fn to_row(event: &Event) -> Result<CreateHistoryEvent, HistoryError> {
    Ok(CreateHistoryEvent {
        history_event_id: event.id(),
        user_id: event.user(),
        event_type: event.event_type().to_string(),
        event_time: event.time(),
        event_data: serde_json::to_string(&event.data().encode()?)?,
    })
}

/// Decode a stored row back into an event.
pub fn from_row(row: HistoryEventRow) -> Result<Event, HistoryError> {
    let payload: serde_json::Value = serde_json::from_str(&row.event_data)?;
    let data = EventData::decode(&row.event_type, payload)?;
    Ok(Event::restore(
        row.history_event_id,
        row.event_time,
        row.user_id,
        data,
    ))
}

/// [`HistoryStore`] backed by the `history_events` table.
#[derive(Clone)]
pub struct PgHistoryStore {
    pool: DbPool,
}

impl PgHistoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn store(&self, event: &Event) -> Result<(), HistoryError> {
        HistoryEventRepo::insert(&self.pool, &to_row(event)?).await?;
        Ok(())
    }

    /// A single undecodable row fails the whole listing.
    async fn list(&self, user: UserId, limit: i64) -> Result<Vec<Event>, HistoryError> {
        HistoryEventRepo::list_for_user(&self.pool, user, limit)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// HistoryWriter
// ---------------------------------------------------------------------------

/// Persists every event published on the `history` topic.
pub struct HistoryWriter<S> {
    store: S,
}

impl<S: HistoryStore> HistoryWriter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Subscribe to the history topic and spawn the writer loop.
    ///
    /// Returns once the loop is running; it stops when `cancel` fires.
    pub async fn start(store: S, bus: &EventBus, cancel: CancellationToken) -> ConsumerHandle {
        let subscription = bus.subscribe(HISTORY_TOPIC).await;
        TopicConsumer::new(subscription, Self::new(store)).start(cancel)
    }
}

#[async_trait]
impl<S: HistoryStore> EventHandler for HistoryWriter<S> {
    fn name(&self) -> &'static str {
        "history"
    }

    async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        self.store.store(event).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::event::EmailData;

    #[test]
    fn row_round_trip_preserves_structured_payload() {
        let payload = json!({
            "plan": "pro",
            "seats": 3,
            "owner": { "name": "Jane", "verified": true },
            "tags": ["billing", "upgrade"]
        });
        let event = Event::new(EventData::decode("plan_changed", payload.clone()).unwrap())
            .with_user(Some(Uuid::new_v4()));

        let row = to_row(&event).unwrap();
        let restored = from_row(HistoryEventRow {
            history_event_id: row.history_event_id,
            user_id: row.user_id,
            event_type: row.event_type,
            event_time: row.event_time,
            event_data: row.event_data,
        })
        .unwrap();

        assert_eq!(restored, event);
        assert_eq!(restored.data().encode().unwrap(), payload);
    }

    #[test]
    fn email_sent_row_decodes_to_typed_payload() {
        let event = Event::new(EventData::EmailSent(EmailData {
            from: "noreply@example.com".to_string(),
            to: "jane@example.com".to_string(),
            subject: "Password Reset".to_string(),
            body: "<a href=\"x\">reset</a>".to_string(),
        }));

        let row = to_row(&event).unwrap();
        assert_eq!(row.event_type, "email_sent");
        assert!(row.user_id.is_none());

        let restored = from_row(HistoryEventRow {
            history_event_id: row.history_event_id,
            user_id: row.user_id,
            event_type: row.event_type,
            event_time: row.event_time,
            event_data: row.event_data,
        })
        .unwrap();
        assert_matches!(restored.data(), EventData::EmailSent(d) if d.to == "jane@example.com");
    }

    #[test]
    fn undecodable_row_is_a_payload_error() {
        let row = HistoryEventRow {
            history_event_id: Uuid::new_v4(),
            user_id: None,
            event_type: "email_sent".to_string(),
            event_time: Utc::now(),
            event_data: "{not json".to_string(),
        };

        assert_matches!(from_row(row), Err(HistoryError::Payload(_)));
    }
}
