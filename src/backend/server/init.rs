/**
 * Server Initialization
 *
 * Builds the relay's state and router and starts the background sweep that
 * drops rooms nobody is connected to.
 */

use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::RelayConfig;
use crate::backend::server::state::AppState;

/// Create and configure the relay application
///
/// Must be called inside a Tokio runtime: the cleanup task is spawned here.
pub fn create_app(config: RelayConfig) -> Router<()> {
    tracing::info!("[Relay] Initializing room relay");

    let app_state = AppState::new(config);
    let app = create_router(app_state.clone());

    let rooms = app_state.rooms.clone();
    let period = app_state.config.cleanup_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = rooms.cleanup_empty_rooms().await;
            if removed > 0 {
                tracing::debug!("[Relay] Cleaned up {} empty rooms", removed);
            }
        }
    });

    tracing::info!("[Relay] Router configured with periodic cleanup task");
    app
}
