/**
 * Application State Management
 *
 * `AppState` is the relay's central state container. The `FromRef`
 * implementation lets handlers extract the room registry directly with
 * `State(RoomRegistry)`.
 */

use axum::extract::FromRef;

use crate::backend::rooms::state::RoomRegistry;
use crate::backend::server::config::RelayConfig;

/// Relay application state
#[derive(Clone)]
pub struct AppState {
    /// Active rooms: broadcast channels and presence
    pub rooms: RoomRegistry,

    /// Settings the relay was started with
    pub config: RelayConfig,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            rooms: RoomRegistry::new(config.room_capacity),
            config,
        }
    }
}

impl FromRef<AppState> for RoomRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rooms.clone()
    }
}
