//! Client error types

use shared::order::{CommandError, CommandErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket connection or protocol failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server rejected a command
    #[error("Command rejected ({code:?}): {message}")]
    Command {
        code: CommandErrorCode,
        message: String,
        item_ids: Vec<String>,
    },

    /// The server answered a read with an error envelope
    #[error("API error {code}: {message}")]
    Api { code: u16, message: String },

    /// Base URL or derived URL is unusable
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local key-value storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<CommandError> for ClientError {
    fn from(err: CommandError) -> Self {
        ClientError::Command {
            code: err.code,
            message: err.message,
            item_ids: err.item_ids,
        }
    }
}

impl ClientError {
    /// Transport-level failures worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_connect() || e.is_timeout(),
            ClientError::WebSocket(_) => true,
            ClientError::Command { code, .. } => *code == CommandErrorCode::PersistenceError,
            _ => false,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
