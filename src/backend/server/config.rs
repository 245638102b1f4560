/**
 * Relay Configuration
 *
 * Loaded from environment variables with defaults suited to local
 * development. A malformed value is logged and replaced by its default; it
 * never prevents startup.
 */

use std::time::Duration;

/// Relay server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// TCP port to listen on (`SERVER_PORT`)
    pub port: u16,
    /// Per-room broadcast capacity (`ROOM_CHANNEL_CAPACITY`)
    pub room_capacity: usize,
    /// Seconds between sweeps for empty rooms (`ROOM_CLEANUP_SECS`)
    pub cleanup_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            room_capacity: 256,
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

impl RelayConfig {
    /// Load relay configuration from the environment
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = read_var("SERVER_PORT", defaults.port);
        let room_capacity = match read_var("ROOM_CHANNEL_CAPACITY", defaults.room_capacity) {
            0 => {
                tracing::warn!("[Relay] ROOM_CHANNEL_CAPACITY must be positive, using default");
                defaults.room_capacity
            }
            n => n,
        };
        let cleanup_secs = read_var("ROOM_CLEANUP_SECS", defaults.cleanup_interval.as_secs()).max(1);

        Self {
            port,
            room_capacity,
            cleanup_interval: Duration::from_secs(cleanup_secs),
        }
    }
}

fn read_var<T: std::str::FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("[Relay] Invalid {}='{}', using {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}
