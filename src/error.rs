//! Error taxonomy shared by every component.
//!
//! Nothing in the library retries or swallows these; each operation hands
//! the failure back to its caller as-is.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Server error: {message}")]
    ServerError { status: Option<u16>, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Bare discriminant of [`Error`], for callers that map kinds to messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    ValidationFailed,
    Unauthenticated,
    Unavailable,
    ServerError,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Error::Unauthenticated => ErrorKind::Unauthenticated,
            Error::Unavailable(_) => ErrorKind::Unavailable,
            Error::ServerError { .. } => ErrorKind::ServerError,
        }
    }

    pub(crate) fn not_found(resource: &'static str, id: impl fmt::Display) -> Self {
        Error::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub(crate) fn server(message: impl Into<String>) -> Self {
        Error::ServerError {
            status: None,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::server(format!("JSON error: {}", e))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::server(format!("Store worker failed: {}", e))
    }
}

/// Reject a required text field that is empty after trimming.
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::ValidationFailed(format!("{} must not be empty", field)));
    }
    Ok(())
}
