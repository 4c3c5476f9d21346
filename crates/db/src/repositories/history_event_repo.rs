//! Repository for the `history_events` table.

use microsaas_core::types::UserId;
use sqlx::PgPool;

use crate::models::history_event::{CreateHistoryEvent, HistoryEventRow};

/// Column list for `history_events` queries.
const COLUMNS: &str = "history_event_id, user_id, event_type, event_time, event_data";

/// Provides read/write operations for the per-user event history.
pub struct HistoryEventRepo;

impl HistoryEventRepo {
    /// Insert a history event. The id is supplied by the producer.
    pub async fn insert(pool: &PgPool, input: &CreateHistoryEvent) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO history_events \
                (history_event_id, user_id, event_type, event_time, event_data) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(input.history_event_id)
        .bind(input.user_id)
        .bind(&input.event_type)
        .bind(input.event_time)
        .bind(&input.event_data)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// List a user's history events, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: UserId,
        limit: i64,
    ) -> Result<Vec<HistoryEventRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM history_events \
             WHERE user_id = $1 ORDER BY event_time DESC LIMIT $2"
        );
        sqlx::query_as::<_, HistoryEventRow>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
