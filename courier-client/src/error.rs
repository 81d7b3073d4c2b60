//! Client error types

use shared::order::{CommandError, CommandErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected a command
    #[error("Command rejected: {0:?}")]
    Command(CommandError),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A claim or session operation is already running
    #[error("Operation already in flight: {0}")]
    Busy(String),

    /// The service could not be reached; retry is manual
    #[error("Transport error: {0}")]
    Transport(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// True when someone else got the order first; the session treats
    /// this as a normal outcome and refreshes the feed.
    pub fn is_claim_conflict(&self) -> bool {
        matches!(self, ClientError::Command(e) if e.code.is_claim_conflict())
    }

    pub fn error_code(&self) -> Option<CommandErrorCode> {
        match self {
            ClientError::Command(e) => Some(e.code),
            _ => None,
        }
    }
}

impl From<CommandError> for ClientError {
    fn from(e: CommandError) -> Self {
        ClientError::Command(e)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
