//! Discount Model
//!
//! Discounts are stored as a flat row (`apply_to` + nullable `category_id` /
//! `item_id`) and converted into [`Discount`] with a tagged [`DiscountScope`]
//! at the repository boundary. Rows that do not carry exactly the target
//! their `apply_to` asks for are rejected.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discount kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a percentage of the qualifying subtotal (10 = 10%)
    Percentage,
    /// `value` is a fixed amount taken once per order
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }
}

impl std::str::FromStr for DiscountKind {
    type Err = DiscountRowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            other => Err(DiscountRowError::UnknownKind(other.to_string())),
        }
    }
}

/// What part of an order a discount applies to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "apply_to", rename_all = "snake_case")]
pub enum DiscountScope {
    /// Every line of the order
    All,
    /// Lines whose menu item category equals `category_id`
    Category { category_id: String },
    /// Lines for the menu item `item_id`
    Item { item_id: String },
}

impl DiscountScope {
    /// Specificity rank used to break ties (higher wins)
    pub fn specificity(&self) -> u8 {
        match self {
            Self::All => 0,
            Self::Category { .. } => 1,
            Self::Item { .. } => 2,
        }
    }
}

/// Discount rule (promotional)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Discount {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub kind: DiscountKind,
    pub value: Decimal,
    #[serde(flatten)]
    pub scope: DiscountScope,
    /// Window start (Unix millis, inclusive)
    pub start_time: Option<i64>,
    /// Window end (Unix millis, exclusive)
    pub end_time: Option<i64>,
    pub is_active: bool,
}

impl Discount {
    /// Active flag set and `now` inside `[start_time, end_time)`; unset bounds are open
    pub fn is_eligible_at(&self, now: i64) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(start) = self.start_time
            && now < start
        {
            return false;
        }
        if let Some(end) = self.end_time
            && now >= end
        {
            return false;
        }
        true
    }
}

/// Flat storage row for a discount
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiscountRow {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    /// "percentage" | "fixed"
    pub kind: String,
    pub value: Decimal,
    /// "all" | "category" | "item"
    pub apply_to: String,
    pub category_id: Option<String>,
    pub item_id: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub is_active: bool,
}

/// Why a storage row could not be turned into a [`Discount`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscountRowError {
    #[error("unknown discount kind: {0}")]
    UnknownKind(String),
    #[error("unknown apply_to: {0}")]
    UnknownScope(String),
    #[error("apply_to={apply_to} requires exactly one matching target")]
    InvalidTarget { apply_to: String },
    #[error("discount value must be non-negative")]
    NegativeValue,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<DiscountRow> for Discount {
    type Error = DiscountRowError;

    fn try_from(row: DiscountRow) -> Result<Self, Self::Error> {
        let kind: DiscountKind = row.kind.parse()?;
        if row.value.is_sign_negative() && !row.value.is_zero() {
            return Err(DiscountRowError::NegativeValue);
        }

        let category_id = non_empty(row.category_id);
        let item_id = non_empty(row.item_id);
        let scope = match (row.apply_to.as_str(), category_id, item_id) {
            ("all", None, None) => DiscountScope::All,
            ("category", Some(category_id), None) => DiscountScope::Category { category_id },
            ("item", None, Some(item_id)) => DiscountScope::Item { item_id },
            ("all" | "category" | "item", _, _) => {
                return Err(DiscountRowError::InvalidTarget {
                    apply_to: row.apply_to,
                });
            }
            (other, _, _) => return Err(DiscountRowError::UnknownScope(other.to_string())),
        };

        Ok(Discount {
            id: row.id,
            restaurant_id: row.restaurant_id,
            name: row.name,
            kind,
            value: row.value,
            scope,
            start_time: row.start_time,
            end_time: row.end_time,
            is_active: row.is_active,
        })
    }
}

impl From<&Discount> for DiscountRow {
    fn from(d: &Discount) -> Self {
        let (apply_to, category_id, item_id) = match &d.scope {
            DiscountScope::All => ("all", None, None),
            DiscountScope::Category { category_id } => ("category", Some(category_id.clone()), None),
            DiscountScope::Item { item_id } => ("item", None, Some(item_id.clone())),
        };
        Self {
            id: d.id.clone(),
            restaurant_id: d.restaurant_id.clone(),
            name: d.name.clone(),
            kind: d.kind.as_str().to_string(),
            value: d.value,
            apply_to: apply_to.to_string(),
            category_id,
            item_id,
            start_time: d.start_time,
            end_time: d.end_time,
            is_active: d.is_active,
        }
    }
}
