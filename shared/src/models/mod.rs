//! Data models
//!
//! Shared between order-server, order-client and the web frontends (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are strings (UUID for server-generated records).

pub mod dining_table;
pub mod discount;
pub mod menu_item;
pub mod restaurant;

// Re-exports
pub use dining_table::*;
pub use discount::*;
pub use menu_item::*;
pub use restaurant::*;
