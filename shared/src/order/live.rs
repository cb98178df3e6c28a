//! Live order feed messages
//!
//! Sent server → client over `/api/live/ws`. One JSON text frame per message,
//! tagged by `type`.

use serde::{Deserialize, Serialize};

use super::status::OrderStatus;
use super::types::Order;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    /// Initial (or post-lag) snapshot of the restaurant's recent window
    Ready { orders: Vec<Order> },
    /// A new order was placed
    Inserted { order: Order },
    /// An existing order changed status
    StatusChanged {
        order_id: String,
        status: OrderStatus,
        updated_at: i64,
    },
}

impl LiveMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::Inserted { .. } => "inserted",
            Self::StatusChanged { .. } => "status_changed",
        }
    }
}
