//! Error types for sagra.
//!
//! Every variant's `Display` is a stable message that can be shown to a user.
//! Internal causes (HTTP status, transport errors) are carried alongside and
//! only end up in logs.

use thiserror::Error;

/// Errors surfaced by sagra operations.
#[derive(Error, Debug)]
pub enum SagraError {
    #[error("Could not reach the event data source. Please try again later.")]
    DataSourceUnavailable { cause: String },

    #[error("Event data is not valid: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("Could not find the specified location")]
    LocationUnresolved(String),

    #[error("You must be logged in to add events")]
    AuthenticationRequired,

    #[error("Generated event id '{0}' already exists, please retry")]
    IdCollision(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SagraError {
    /// Internal cause for logging, when one exists beyond the user-facing message.
    pub fn cause(&self) -> Option<&str> {
        match self {
            SagraError::DataSourceUnavailable { cause } => Some(cause),
            SagraError::LocationUnresolved(reason) => Some(reason),
            _ => None,
        }
    }

    /// The individual rule violations of a `ValidationFailed` error.
    pub fn violations(&self) -> &[String] {
        match self {
            SagraError::ValidationFailed(messages) => messages,
            _ => &[],
        }
    }
}

impl From<SourceError> for SagraError {
    fn from(e: SourceError) -> Self {
        SagraError::DataSourceUnavailable {
            cause: e.to_string(),
        }
    }
}

/// Failure reported by a remote adapter (tabular source or geocoding service).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Result type alias for sagra operations.
pub type SagraResult<T> = Result<T, SagraError>;
