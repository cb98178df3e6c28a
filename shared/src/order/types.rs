//! Order records, request payloads and command results

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::status::OrderStatus;
use crate::error::ErrorCode;

/// Line item snapshot embedded in an order
///
/// Name, price and category are copied from the menu at order time and
/// never change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineItem {
    pub menu_item_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl OrderLineItem {
    /// `price × quantity`, unrounded
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Persisted order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub restaurant_id: String,
    pub table_id: String,
    pub table_name: String,
    pub items: Vec<OrderLineItem>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_discount_id: Option<String>,
    pub total: Decimal,
    pub commission_rate: Decimal,
    pub commission_amount: Decimal,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Unix millis, immutable
    pub created_at: i64,
    /// Unix millis, bumped on every status write
    pub updated_at: i64,
}

/// Customer-facing view of an order for the tracking page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderTracking {
    pub order_id: String,
    pub table_name: String,
    pub status: OrderStatus,
    pub items: Vec<OrderLineItem>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<&Order> for OrderTracking {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id.clone(),
            table_name: order.table_name.clone(),
            status: order.status,
            items: order.items.clone(),
            subtotal: order.subtotal,
            discount_amount: order.discount_amount,
            total: order.total,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// ============================================================================
// Request payloads
// ============================================================================

/// One cart line as submitted by the customer
///
/// `name`, `price` and `image` are display leftovers from the cart. They are
/// accepted so older clients keep working but are never used for pricing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLineInput {
    pub id: String,
    #[serde(alias = "qty")]
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl CartLineInput {
    pub fn new(id: impl Into<String>, quantity: i64) -> Self {
        Self {
            id: id.into(),
            quantity,
            name: None,
            price: None,
            image: None,
        }
    }
}

/// Place-order request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateOrderRequest {
    pub table_id: String,
    pub items: Vec<CartLineInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Read-only pricing preview request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewOrderRequest {
    pub table_id: String,
    pub items: Vec<CartLineInput>,
}

/// Status change request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

// ============================================================================
// Results
// ============================================================================

/// Authoritative totals the server would charge right now
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingPreview {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_discount_id: Option<String>,
}

/// Pricing preview response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewResponse {
    pub success: bool,
    #[serde(flatten)]
    pub pricing: Option<PricingPreview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl PreviewResponse {
    pub fn success(pricing: PricingPreview) -> Self {
        Self {
            success: true,
            pricing: Some(pricing),
            error: None,
        }
    }

    pub fn error(error: CommandError) -> Self {
        Self {
            success: false,
            pricing: None,
            error: Some(error),
        }
    }
}

/// Command response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandResponse {
    /// Whether the command succeeded
    pub success: bool,
    /// Order the command created or changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Status after a status command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    /// Server `updated_at` of the order after a status command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Error details if failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CommandError>,
}

impl CommandResponse {
    pub fn created(order_id: String) -> Self {
        Self {
            success: true,
            order_id: Some(order_id),
            status: Some(OrderStatus::Pending),
            updated_at: None,
            error: None,
        }
    }

    pub fn status_changed(order_id: String, status: OrderStatus, updated_at: i64) -> Self {
        Self {
            success: true,
            order_id: Some(order_id),
            status: Some(status),
            updated_at: Some(updated_at),
            error: None,
        }
    }

    pub fn error(error: CommandError) -> Self {
        Self {
            success: false,
            order_id: None,
            status: None,
            updated_at: None,
            error: Some(error),
        }
    }
}

/// Command error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandError {
    pub code: CommandErrorCode,
    pub message: String,
    /// Offending menu item ids for `ITEMS_NOT_FOUND` / `ITEMS_UNAVAILABLE`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub item_ids: Vec<String>,
}

impl CommandError {
    pub fn new(code: CommandErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            item_ids: Vec::new(),
        }
    }

    pub fn with_item_ids(mut self, ids: Vec<String>) -> Self {
        self.item_ids = ids;
        self
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

/// Command error codes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandErrorCode {
    ValidationError,
    TableNotFound,
    TableInactive,
    ItemsNotFound,
    ItemsUnavailable,
    OrderNotFound,
    InvalidTransition,
    PersistenceError,
    InternalError,
}

impl CommandErrorCode {
    /// Unified error code (and through it the HTTP status)
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ValidationError => ErrorCode::ValidationFailed,
            Self::TableNotFound => ErrorCode::TableNotFound,
            Self::TableInactive => ErrorCode::TableInactive,
            Self::ItemsNotFound => ErrorCode::MenuItemNotFound,
            Self::ItemsUnavailable => ErrorCode::MenuItemUnavailable,
            Self::OrderNotFound => ErrorCode::OrderNotFound,
            Self::InvalidTransition => ErrorCode::InvalidStatusTransition,
            Self::PersistenceError => ErrorCode::DatabaseError,
            Self::InternalError => ErrorCode::InternalError,
        }
    }
}
