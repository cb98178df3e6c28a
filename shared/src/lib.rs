//! Shared types for the ordering platform
//!
//! Common types used by order-server, order-client and the web frontends:
//! error codes, the response envelope, catalog models and order records.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};
