/**
 * Backend Error Types
 *
 * Errors raised by relay handlers. Each converts to an HTTP response; see
 * `conversion.rs`.
 *
 * # Error Categories
 *
 * - `HandlerError` - routing failures such as an unknown path
 * - `ProtocolError` - a client frame broke the room protocol
 * - `Classroom` - a wrapped `ClassroomError`, e.g. an invalid room id
 * - `SerializationError` - the relay could not encode its own envelope
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::error::ClassroomError;

/// Backend-specific error types
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., unknown route)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Room protocol error
    #[error("Protocol error: {message}")]
    ProtocolError { message: String },

    /// Error from the shared classroom types
    #[error(transparent)]
    Classroom(#[from] ClassroomError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    /// HTTP status code for this error
    ///
    /// Wrapped classroom errors are client mistakes (400) unless they are
    /// connectivity or encoding failures (500).
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::ProtocolError { .. } => StatusCode::BAD_REQUEST,
            Self::Classroom(err) if err.is_user_facing() => StatusCode::BAD_REQUEST,
            Self::Classroom(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::ProtocolError { message } => message.clone(),
            Self::Classroom(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }
}
