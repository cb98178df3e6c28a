//! Numeric error codes shared by order-server and order-client
//!
//! Codes are grouped by the thousand:
//! - 0xxx: General
//! - 2xxx: Request scope
//! - 4xxx: Orders
//! - 6xxx: Menu
//! - 7xxx: Tables
//! - 9xxx: System

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code carried in the `code` field of every API envelope
///
/// Serialized as a bare `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    Success = 0,
    /// Request body or query failed validation
    ValidationFailed = 2,

    // ==================== 2xxx: Scope ====================
    /// Request carried no `X-Restaurant-Id`
    RestaurantScopeRequired = 2002,

    // ==================== 4xxx: Order ====================
    OrderNotFound = 4001,
    /// Status machine refused the transition
    InvalidStatusTransition = 4008,

    // ==================== 6xxx: Menu ====================
    MenuItemNotFound = 6001,
    MenuItemUnavailable = 6003,

    // ==================== 7xxx: Table ====================
    TableNotFound = 7001,
    TableInactive = 7002,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    /// Repository read or write failed
    DatabaseError = 9002,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Default English message, used when no specific one is given
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::RestaurantScopeRequired => "Restaurant scope is required",
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidStatusTransition => "Order status transition is not allowed",
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemUnavailable => "Menu item is unavailable",
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableInactive => "Table is inactive",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// A `u16` that names no [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            2002 => Ok(ErrorCode::RestaurantScopeRequired),
            4001 => Ok(ErrorCode::OrderNotFound),
            4008 => Ok(ErrorCode::InvalidStatusTransition),
            6001 => Ok(ErrorCode::MenuItemNotFound),
            6003 => Ok(ErrorCode::MenuItemUnavailable),
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableInactive),
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
