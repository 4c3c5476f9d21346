use std::sync::Arc;

use microsaas_events::{ConsumerStatus, HistoryStore, Mailer};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: microsaas_db::DbPool,
    /// Transactional email, used by signup and recovery flows.
    pub mailer: Arc<Mailer>,
    /// Read side of the per-user event history.
    pub history: Arc<dyn HistoryStore>,
    /// Topic consumers started at boot, reported by `/health`.
    pub consumers: Arc<[ConsumerStatus]>,
}
