//! Application configuration module
//!
//! Client-side settings for a classroom session: where the HTTP collaborators
//! and the room relay live, and how the board behaves.

use thiserror::Error;

const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
const DEFAULT_SOCKET_URL: &str = "ws://localhost:3000";
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the HTTP API (video tokens, syllabus)
    pub server_url: String,
    /// Base URL of the room relay
    pub socket_url: String,
    /// Whether freeform boards accept drag moves
    pub free_mode: bool,
    /// Capacity of the incoming event channel of a relay connection
    pub event_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            free_mode: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !has_scheme(&self.server_url, &["http://", "https://"]) {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        if !has_scheme(&self.socket_url, &["ws://", "wss://"]) {
            return Err(ConfigError::InvalidUrl(self.socket_url.clone()));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "event_capacity",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|scheme| url.starts_with(scheme) && url.len() > scheme.len())
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    socket_url: Option<String>,
    free_mode: Option<bool>,
    event_capacity: Option<usize>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the relay URL
    pub fn socket_url(mut self, url: impl Into<String>) -> Self {
        self.socket_url = Some(url.into());
        self
    }

    pub fn free_mode(mut self, enabled: bool) -> Self {
        self.free_mode = Some(enabled);
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            server_url: trim_slash(self.server_url.unwrap_or(defaults.server_url)),
            socket_url: trim_slash(self.socket_url.unwrap_or(defaults.socket_url)),
            free_mode: self.free_mode.unwrap_or(defaults.free_mode),
            event_capacity: self.event_capacity.unwrap_or(defaults.event_capacity),
        };
        config.validate()?;
        Ok(config)
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}
