//! Handlers for the `/users/{id}/history` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use microsaas_core::error::CoreError;
use microsaas_core::types::UserId;
use microsaas_events::Event;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Default page size for history listing.
pub const DEFAULT_LIMIT: i64 = 25;

/// Maximum page size for history listing.
const MAX_LIMIT: i64 = 100;

/// Query parameters for `GET /users/{id}/history`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of events. Defaults to 25, capped at 100.
    pub limit: Option<i64>,
}

/// GET /users/{id}/history -- the user's most recent events, newest first.
///
/// Any storage failure, including an undecodable stored payload, is reported
/// as "not found".
pub async fn list_history(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<Event>>> {
    let limit = match query.limit {
        Some(limit) if limit < 1 => {
            return Err(AppError::BadRequest("limit must be at least 1".to_string()))
        }
        Some(limit) => limit.min(MAX_LIMIT),
        None => DEFAULT_LIMIT,
    };

    let events = state.history.list(user_id, limit).await.map_err(|e| {
        tracing::error!(error = %e, user = %user_id, "Could not get history events");
        AppError::Core(CoreError::NotFound {
            entity: "User history",
            id: user_id.to_string(),
        })
    })?;

    Ok(Json(events))
}
