/**
 * Router Configuration
 *
 * Assembles the relay's routes:
 *
 * - `GET /rooms/{room_id}/ws` - room WebSocket
 * - `GET /rooms` - active rooms with member counts
 * - `GET /health` - liveness probe
 *
 * Unknown paths fall through to a JSON 404.
 */

use axum::{http::StatusCode, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::backend::error::BackendError;
use crate::backend::rooms::handlers::{handle_room_socket, health, list_rooms};
use crate::backend::server::state::AppState;

/// Create the axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/rooms/{room_id}/ws", get(handle_room_socket))
        .route("/rooms", get(list_rooms))
        .route("/health", get(health))
        .fallback(|| async { BackendError::handler(StatusCode::NOT_FOUND, "Not Found") })
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
