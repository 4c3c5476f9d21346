//! Service health: database reachability plus the state of every event
//! consumer.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use microsaas_events::{ConsumerState, ConsumerStatus};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database or any consumer is down.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Consumer name to state, e.g. `{"history": "running"}`.
    pub consumers: BTreeMap<&'static str, ConsumerState>,
}

impl HealthResponse {
    fn new(db_healthy: bool, consumers: &[ConsumerStatus]) -> Self {
        let consumers: BTreeMap<_, _> = consumers.iter().map(|c| (c.name(), c.state())).collect();
        let consumers_running = consumers.values().all(|s| *s == ConsumerState::Running);

        Self {
            status: if db_healthy && consumers_running { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            db_healthy,
            consumers,
        }
    }
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match microsaas_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    Json(HealthResponse::new(db_healthy, &state.consumers))
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
