use shared::error::{AppError, ErrorCode};
use shared::order::{CommandError, CommandErrorCode, OrderStatus};
use thiserror::Error;

use crate::repo::RepoError;

/// Order service errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table is inactive: {0}")]
    TableInactive(String),

    #[error("Menu items not found: {}", .0.join(", "))]
    ItemsNotFound(Vec<String>),

    #[error("Menu items unavailable: {}", .0.join(", "))]
    ItemsUnavailable(Vec<String>),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Persistence error: {0}")]
    Persistence(#[from] RepoError),

    #[error("Internal error: {0}")]
    Unknown(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl OrderError {
    pub fn command_code(&self) -> CommandErrorCode {
        match self {
            Self::Validation(_) => CommandErrorCode::ValidationError,
            Self::TableNotFound(_) => CommandErrorCode::TableNotFound,
            Self::TableInactive(_) => CommandErrorCode::TableInactive,
            Self::ItemsNotFound(_) => CommandErrorCode::ItemsNotFound,
            Self::ItemsUnavailable(_) => CommandErrorCode::ItemsUnavailable,
            Self::OrderNotFound(_) => CommandErrorCode::OrderNotFound,
            Self::InvalidTransition { .. } => CommandErrorCode::InvalidTransition,
            Self::Persistence(_) => CommandErrorCode::PersistenceError,
            Self::Unknown(_) => CommandErrorCode::InternalError,
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        self.command_code().error_code()
    }

    /// Message safe to show to clients; storage details stay in the logs
    fn public_message(&self) -> String {
        match self {
            Self::Persistence(e) => {
                tracing::error!(error = %e, "Order persistence failed");
                "Failed to save order, please retry".to_string()
            }
            Self::Unknown(msg) => {
                tracing::error!(error = %msg, "Order operation failed");
                "Unexpected error, please retry".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<OrderError> for CommandError {
    fn from(err: OrderError) -> Self {
        let code = err.command_code();
        let message = err.public_message();
        let error = CommandError::new(code, message);
        match err {
            OrderError::ItemsNotFound(ids) | OrderError::ItemsUnavailable(ids) => {
                error.with_item_ids(ids)
            }
            _ => error,
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let code = err.error_code();
        AppError::with_message(code, err.public_message())
    }
}
