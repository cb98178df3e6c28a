//! Aggregates for the restaurant dashboard and the platform-admin console

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::status::OrderStatus;
use super::types::Order;

/// Order count per status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    pub preparing: u64,
    pub completed: u64,
    pub cancelled: u64,
}

impl StatusCounts {
    pub fn bump(&mut self, status: OrderStatus) {
        match status {
            OrderStatus::Pending => self.pending += 1,
            OrderStatus::Preparing => self.preparing += 1,
            OrderStatus::Completed => self.completed += 1,
            OrderStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.pending + self.preparing + self.completed + self.cancelled
    }
}

/// Per-restaurant dashboard aggregates
///
/// Money sums exclude cancelled orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardStats {
    pub restaurant_id: String,
    pub counts: StatusCounts,
    pub gross_subtotal: Decimal,
    pub discount_total: Decimal,
    pub net_total: Decimal,
    pub commission_total: Decimal,
    /// Unix millis the aggregates were computed at
    pub computed_at: i64,
}

impl DashboardStats {
    pub fn from_orders<'a>(
        restaurant_id: impl Into<String>,
        orders: impl IntoIterator<Item = &'a Order>,
        computed_at: i64,
    ) -> Self {
        let mut stats = Self {
            restaurant_id: restaurant_id.into(),
            computed_at,
            ..Default::default()
        };
        for order in orders {
            stats.counts.bump(order.status);
            if order.status == OrderStatus::Cancelled {
                continue;
            }
            stats.gross_subtotal += order.subtotal;
            stats.discount_total += order.discount_amount;
            stats.net_total += order.total;
            stats.commission_total += order.commission_amount;
        }
        stats
    }
}

/// Commission billing line for one restaurant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommissionSummary {
    pub restaurant_id: String,
    pub restaurant_name: String,
    /// Billable (non-cancelled) orders
    pub order_count: u64,
    pub net_total: Decimal,
    pub commission_total: Decimal,
}
