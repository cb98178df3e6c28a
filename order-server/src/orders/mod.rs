//! Order commands and queries
//!
//! - **service**: [`OrderService`], order creation, status transitions and reads
//! - **error**: [`OrderError`] and its mapping onto command/HTTP error codes
//!
//! # Data Flow
//!
//! ```text
//! HTTP handler → OrderService → Repositories (catalog reads, order write)
//!                      ↓
//!               LiveOrderHub (inserted / status_changed)
//!                      ↓
//!               DashboardCache::invalidate
//! ```

mod error;
mod service;

pub use error::*;
pub use service::*;

#[cfg(test)]
mod tests;
