//! OrderBoard: reconciled local view of a restaurant's orders
//!
//! Three sources write here: push events, full-window polls and local
//! optimistic edits. Rows are matched by order id and ordered by the server's
//! `updated_at`:
//!
//! - a remote row older than the held one is ignored
//! - a remote row at least as new replaces the held one, optimistic edits included
//! - optimistic edits never bump `updated_at`
//!
//! Snapshots merge by upsert and never delete; applying the same snapshot
//! twice leaves the board as applying it once.

use std::collections::HashMap;

use parking_lot::RwLock;
use shared::order::{LiveMessage, Order, OrderStatus};

use crate::http::{OrderCommands, StatusChange};
use crate::ClientResult;

/// Effect of one remote row on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardChange {
    Inserted,
    Updated,
    Unchanged,
    /// Older than the held row
    IgnoredStale,
}

impl BoardChange {
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Inserted | Self::Updated)
    }
}

/// Effect of one live message on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// `ready` window merged; ids not held before
    Snapshot { inserted: Vec<String> },
    Changed { order_id: String, change: BoardChange },
    /// Status event for an order the board does not hold
    NeedsFetch(String),
}

#[derive(Debug, Default)]
struct BoardState {
    orders: HashMap<String, Order>,
    /// Pre-edit rows of orders with an optimistic edit in flight
    pending: HashMap<String, Order>,
}

impl BoardState {
    fn upsert(&mut self, order: Order) -> BoardChange {
        let Some(held) = self.orders.get(&order.id) else {
            self.orders.insert(order.id.clone(), order);
            return BoardChange::Inserted;
        };
        if held.updated_at > order.updated_at {
            return BoardChange::IgnoredStale;
        }
        let optimistic = self.pending.remove(&order.id).is_some();
        if !optimistic && *held == order {
            return BoardChange::Unchanged;
        }
        self.orders.insert(order.id.clone(), order);
        BoardChange::Updated
    }
}

/// Thread-safe order board
#[derive(Debug, Default)]
pub struct OrderBoard {
    state: RwLock<BoardState>,
}

impl OrderBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, order: Order) -> BoardChange {
        self.state.write().upsert(order)
    }

    /// Merge a full window; returns the ids that were not held before
    pub fn apply_snapshot(&self, orders: Vec<Order>) -> Vec<String> {
        let mut state = self.state.write();
        let mut inserted = Vec::new();
        for order in orders {
            let id = order.id.clone();
            if state.upsert(order) == BoardChange::Inserted {
                inserted.push(id);
            }
        }
        inserted
    }

    pub fn apply_event(&self, message: &LiveMessage) -> EventOutcome {
        match message {
            LiveMessage::Ready { orders } => EventOutcome::Snapshot {
                inserted: self.apply_snapshot(orders.clone()),
            },
            LiveMessage::Inserted { order } => EventOutcome::Changed {
                order_id: order.id.clone(),
                change: self.upsert(order.clone()),
            },
            LiveMessage::StatusChanged {
                order_id,
                status,
                updated_at,
            } => self.apply_status_event(order_id, *status, *updated_at),
        }
    }

    fn apply_status_event(&self, order_id: &str, status: OrderStatus, updated_at: i64) -> EventOutcome {
        let mut state = self.state.write();
        let Some(held) = state.orders.get(order_id) else {
            return EventOutcome::NeedsFetch(order_id.to_string());
        };
        let change = if held.updated_at > updated_at {
            BoardChange::IgnoredStale
        } else {
            let optimistic = state.pending.remove(order_id).is_some();
            match state.orders.get_mut(order_id) {
                Some(held)
                    if !optimistic && held.status == status && held.updated_at == updated_at =>
                {
                    BoardChange::Unchanged
                }
                Some(held) => {
                    held.status = status;
                    held.updated_at = updated_at;
                    BoardChange::Updated
                }
                None => BoardChange::Unchanged,
            }
        };
        EventOutcome::Changed {
            order_id: order_id.to_string(),
            change,
        }
    }

    /// Show a status change before the server confirms it
    ///
    /// Returns `false` when the order is not on the board.
    pub fn apply_optimistic(&self, order_id: &str, status: OrderStatus) -> bool {
        let mut state = self.state.write();
        let Some(held) = state.orders.get(order_id).cloned() else {
            return false;
        };
        // keep the oldest pre-edit row when edits stack up
        state.pending.entry(order_id.to_string()).or_insert(held);
        if let Some(row) = state.orders.get_mut(order_id) {
            row.status = status;
        }
        true
    }

    /// Undo an optimistic edit
    ///
    /// No-op when a remote row already replaced it.
    pub fn rollback(&self, order_id: &str) -> bool {
        let mut state = self.state.write();
        match state.pending.remove(order_id) {
            Some(previous) => {
                state.orders.insert(order_id.to_string(), previous);
                true
            }
            None => false,
        }
    }

    /// Keep an optimistic edit with what the server reported
    ///
    /// The server's `updated_at` is stamped on the row, so a window fetched
    /// before the write no longer counts as current.
    pub fn confirm(&self, order_id: &str, change: StatusChange) {
        let mut state = self.state.write();
        if state.pending.remove(order_id).is_some()
            && let Some(row) = state.orders.get_mut(order_id)
        {
            row.status = change.status;
            if let Some(updated_at) = change.updated_at {
                row.updated_at = row.updated_at.max(updated_at);
            }
        }
    }

    pub fn has_pending_edit(&self, order_id: &str) -> bool {
        self.state.read().pending.contains_key(order_id)
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.state.read().orders.get(order_id).cloned()
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.state.read().orders.contains_key(order_id)
    }

    /// All orders, newest first
    pub fn orders(&self) -> Vec<Order> {
        let mut orders: Vec<Order> = self.state.read().orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        orders
    }

    /// Orders in one status, oldest first (kitchen queue order)
    pub fn by_status(&self, status: OrderStatus) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .state
            .read()
            .orders
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        orders
    }

    pub fn len(&self) -> usize {
        self.state.read().orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.state.write();
        state.orders.clear();
        state.pending.clear();
    }
}

/// Optimistically change an order's status and send the command
///
/// On failure the board is rolled back and the server error returned.
pub async fn apply_status_change(
    board: &OrderBoard,
    commands: &dyn OrderCommands,
    order_id: &str,
    status: OrderStatus,
) -> ClientResult<OrderStatus> {
    board.apply_optimistic(order_id, status);

    let result = match status {
        OrderStatus::Cancelled => commands.cancel(order_id).await,
        _ => commands.update_status(order_id, status).await,
    };
    match result {
        Ok(confirmed) => {
            board.confirm(order_id, confirmed);
            Ok(confirmed.status)
        }
        Err(e) => {
            if board.rollback(order_id) {
                tracing::warn!(order_id = %order_id, error = %e, "Status change failed, rolled back");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(id: &str, status: OrderStatus, created_at: i64, updated_at: i64) -> Order {
        Order {
            id: id.into(),
            restaurant_id: "r1".into(),
            table_id: "t1".into(),
            table_name: "Table 1".into(),
            items: vec![],
            subtotal: dec!(10.00),
            discount_amount: dec!(0),
            applied_discount_id: None,
            total: dec!(10.00),
            commission_rate: dec!(0.05),
            commission_amount: dec!(0.50),
            status,
            customer_name: None,
            notes: None,
            created_at,
            updated_at,
        }
    }

    #[test]
    fn test_upsert_outcomes() {
        let board = OrderBoard::new();
        let o = order("o1", OrderStatus::Pending, 1, 1);
        assert_eq!(board.upsert(o.clone()), BoardChange::Inserted);
        assert_eq!(board.upsert(o.clone()), BoardChange::Unchanged);

        let newer = order("o1", OrderStatus::Preparing, 1, 5);
        assert_eq!(board.upsert(newer), BoardChange::Updated);
        assert_eq!(board.upsert(o), BoardChange::IgnoredStale);
        assert_eq!(board.get("o1").unwrap().status, OrderStatus::Preparing);
    }

    #[test]
    fn test_status_event_for_unknown_order_needs_fetch() {
        let board = OrderBoard::new();
        let outcome = board.apply_event(&LiveMessage::StatusChanged {
            order_id: "ghost".into(),
            status: OrderStatus::Preparing,
            updated_at: 3,
        });
        assert_eq!(outcome, EventOutcome::NeedsFetch("ghost".into()));
        assert!(board.is_empty());
    }

    #[test]
    fn test_stale_status_event_ignored() {
        let board = OrderBoard::new();
        board.upsert(order("o1", OrderStatus::Completed, 1, 10));
        let outcome = board.apply_event(&LiveMessage::StatusChanged {
            order_id: "o1".into(),
            status: OrderStatus::Preparing,
            updated_at: 5,
        });
        assert_eq!(
            outcome,
            EventOutcome::Changed {
                order_id: "o1".into(),
                change: BoardChange::IgnoredStale
            }
        );
        assert_eq!(board.get("o1").unwrap().status, OrderStatus::Completed);
    }

    #[test]
    fn test_optimistic_rollback_restores_previous_row() {
        let board = OrderBoard::new();
        board.upsert(order("o1", OrderStatus::Pending, 1, 1));
        assert!(board.apply_optimistic("o1", OrderStatus::Preparing));
        assert_eq!(board.get("o1").unwrap().status, OrderStatus::Preparing);
        assert_eq!(board.get("o1").unwrap().updated_at, 1);

        assert!(board.rollback("o1"));
        assert_eq!(board.get("o1").unwrap().status, OrderStatus::Pending);
        assert!(!board.rollback("o1"));
    }

    #[test]
    fn test_remote_row_replaces_optimistic_edit() {
        let board = OrderBoard::new();
        board.upsert(order("o1", OrderStatus::Pending, 1, 1));
        board.apply_optimistic("o1", OrderStatus::Preparing);

        // same timestamp: the server's view still wins
        assert_eq!(
            board.upsert(order("o1", OrderStatus::Pending, 1, 1)),
            BoardChange::Updated
        );
        assert_eq!(board.get("o1").unwrap().status, OrderStatus::Pending);
        assert!(!board.has_pending_edit("o1"));
        // nothing left to roll back
        assert!(!board.rollback("o1"));
    }

    #[test]
    fn test_confirm_stamps_server_timestamp() {
        let board = OrderBoard::new();
        board.upsert(order("o1", OrderStatus::Pending, 1, 1));
        board.apply_optimistic("o1", OrderStatus::Preparing);
        board.confirm(
            "o1",
            StatusChange {
                status: OrderStatus::Preparing,
                updated_at: Some(9),
            },
        );

        let held = board.get("o1").unwrap();
        assert_eq!(held.status, OrderStatus::Preparing);
        assert_eq!(held.updated_at, 9);
        // a window read before the write is now stale
        assert_eq!(
            board.upsert(order("o1", OrderStatus::Pending, 1, 1)),
            BoardChange::IgnoredStale
        );
    }

    #[test]
    fn test_ordering() {
        let board = OrderBoard::new();
        board.apply_snapshot(vec![
            order("a", OrderStatus::Pending, 1, 1),
            order("b", OrderStatus::Pending, 3, 3),
            order("c", OrderStatus::Preparing, 2, 2),
        ]);
        let ids: Vec<_> = board.orders().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        let pending: Vec<_> = board
            .by_status(OrderStatus::Pending)
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(pending, vec!["a", "b"]);
    }
}
