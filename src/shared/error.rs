//! Shared Error Types
//!
//! This module defines the error type returned by every fallible operation of
//! the classroom engine, on both the client and the relay side.
//!
//! # Error Categories
//!
//! - `ParseError` - Game data that yields no usable position
//! - `IllegalMove` - A standard move the rules engine refuses
//! - `PermissionDenied` - A move or control change the actor may not make
//! - `InvalidState` - An operation attempted in the wrong mode (scrubbing, strict mode)
//! - `ValidationError` - Malformed input (squares, chapters, configuration values)
//! - `TransportError` - The room channel is not available
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ApiError` - An HTTP collaborator answered with an error
//!
//! Divergence between peers is deliberately absent: a remote update that
//! cannot be applied is logged and absorbed, never surfaced as an error.
//!
//! # Usage
//!
//! ```rust
//! use chessroom::shared::error::ClassroomError;
//!
//! let error = ClassroomError::validation("square", "Square 'z9' is off the board");
//! ```
use thiserror::Error;

/// Errors produced by the classroom engine and its collaborators
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassroomError {
    /// No usable position could be derived from the input
    #[error("Parse error: {message}")]
    ParseError {
        /// Human-readable error message
        message: String,
    },

    /// The rules engine rejected a standard move
    #[error("Illegal move: {from} -> {to}")]
    IllegalMove {
        /// Origin square as typed by the caller
        from: String,
        /// Destination square as typed by the caller
        to: String,
    },

    /// The acting participant may not perform this action
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Human-readable error message
        message: String,
    },

    /// The position is not in a state that accepts this operation
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// The room channel could not carry the message
    #[error("Transport error: {message}")]
    TransportError {
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// An HTTP collaborator (token issuer, syllabus service) failed
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code, or 0 when no response was received
        status: u16,
        /// Human-readable error message
        message: String,
    },
}

impl ClassroomError {
    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create a new illegal move error
    pub fn illegal_move(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::IllegalMove {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a new permission error
    pub fn permission(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a new invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Whether the error should be shown to the user as a notice.
    ///
    /// Transport and serialization failures are connectivity problems and
    /// surface through the connection indicator instead.
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::TransportError { .. } | Self::SerializationError { .. }
        )
    }
}

/// Helper trait for converting serialization errors
impl From<serde_json::Error> for ClassroomError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for ClassroomError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16()).unwrap_or(0);
        Self::api(status, err.to_string())
    }
}
