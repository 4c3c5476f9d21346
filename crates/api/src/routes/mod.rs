pub mod health;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /users/{id}/history                              list history events (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/users/{id}/history", get(handlers::history::list_history))
}
