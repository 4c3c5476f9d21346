//! History event entity model.

use microsaas_core::types::{EventId, Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `history_events` table.
///
/// `event_data` is kept as JSON text; decoding it into a typed payload is the
/// caller's job.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryEventRow {
    pub history_event_id: EventId,
    pub user_id: Option<UserId>,
    pub event_type: String,
    pub event_time: Timestamp,
    pub event_data: String,
}

/// DTO for inserting a history event.
#[derive(Debug, Clone)]
pub struct CreateHistoryEvent {
    pub history_event_id: EventId,
    pub user_id: Option<UserId>,
    pub event_type: String,
    pub event_time: Timestamp,
    pub event_data: String,
}
