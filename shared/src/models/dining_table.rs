//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table entity, addressed by the per-table QR code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub is_active: bool,
}
