//! Menu Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Menu item entity
///
/// `price` is authoritative: order lines are always re-priced from here,
/// never from what the customer's cart claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub price: Decimal,
    /// Category label, matched against category-scoped discounts
    pub category: Option<String>,
    pub available: bool,
}
