//! Error codes and the API envelope
//!
//! - [`ErrorCode`]: numeric codes sent to clients
//! - [`ErrorCategory`]: code group, used to decide what gets logged
//! - [`AppError`]: handler error carrying a code, message and details
//! - [`ApiResponse`]: `{code, message, data}` envelope
//!
//! # Error Code Ranges
//!
//! - 0xxx: General
//! - 2xxx: Request scope
//! - 4xxx: Orders
//! - 6xxx: Menu
//! - 7xxx: Tables
//! - 9xxx: System
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::TableNotFound);
//!
//! let err = AppError::validation("quantity must be between 1 and 99")
//!     .with_detail("field", "items[0].quantity");
//!
//! let response = ApiResponse::<()>::error(&err);
//! assert_eq!(response.code, Some(2));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
