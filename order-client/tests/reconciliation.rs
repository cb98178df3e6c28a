use std::sync::Arc;

use async_trait::async_trait;
use order_client::{
    BoardChange, ClientError, ClientResult, EventOutcome, LiveMessage, Order, OrderBoard,
    OrderCommands, OrderStatus, StatusChange, apply_status_change,
};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use shared::order::CommandErrorCode;

fn order(id: &str, status: OrderStatus, created_at: i64, updated_at: i64) -> Order {
    Order {
        id: id.into(),
        restaurant_id: "r1".into(),
        table_id: "t1".into(),
        table_name: "Table 1".into(),
        items: vec![],
        subtotal: dec!(20.00),
        discount_amount: dec!(0),
        applied_discount_id: None,
        total: dec!(20.00),
        commission_rate: dec!(0.05),
        commission_amount: dec!(1.00),
        status,
        customer_name: None,
        notes: None,
        created_at,
        updated_at,
    }
}

fn status_event(id: &str, status: OrderStatus, updated_at: i64) -> LiveMessage {
    LiveMessage::StatusChanged {
        order_id: id.into(),
        status,
        updated_at,
    }
}

/// Server-side `updated_at` the fake reports for every write
const WRITTEN_AT: i64 = 10;

/// Records calls; fails when `reject` is set
#[derive(Default)]
struct FakeCommands {
    reject: bool,
    calls: Mutex<Vec<(String, OrderStatus)>>,
}

#[async_trait]
impl OrderCommands for FakeCommands {
    async fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> ClientResult<StatusChange> {
        self.calls.lock().push((order_id.to_string(), status));
        if self.reject {
            return Err(ClientError::Command {
                code: CommandErrorCode::InvalidTransition,
                message: "Cannot change order status".into(),
                item_ids: vec![],
            });
        }
        Ok(StatusChange {
            status,
            updated_at: Some(WRITTEN_AT),
        })
    }

    async fn cancel(&self, order_id: &str) -> ClientResult<StatusChange> {
        self.update_status(order_id, OrderStatus::Cancelled).await
    }
}

#[test]
fn same_snapshot_twice_equals_once() {
    let window = vec![
        order("a", OrderStatus::Pending, 1, 1),
        order("b", OrderStatus::Preparing, 2, 4),
    ];

    let board = OrderBoard::new();
    let first = board.apply_snapshot(window.clone());
    let after_once = board.orders();
    let second = board.apply_snapshot(window);

    assert_eq!(first, vec!["a".to_string(), "b".to_string()]);
    assert!(second.is_empty());
    assert_eq!(board.orders(), after_once);
}

#[test]
fn snapshot_merges_without_deleting() {
    let board = OrderBoard::new();
    board.apply_snapshot(vec![order("a", OrderStatus::Pending, 1, 1)]);
    board.apply_snapshot(vec![order("b", OrderStatus::Pending, 2, 2)]);
    assert_eq!(board.len(), 2);
}

#[test]
fn event_and_poll_overlap_converge() {
    // push event arrives first, then a poll with the same row
    let pushed = OrderBoard::new();
    pushed.apply_event(&LiveMessage::Inserted {
        order: order("a", OrderStatus::Pending, 1, 1),
    });
    pushed.apply_event(&status_event("a", OrderStatus::Preparing, 2));
    pushed.apply_snapshot(vec![order("a", OrderStatus::Preparing, 1, 2)]);

    // poll first, then the late (now stale) events
    let polled = OrderBoard::new();
    polled.apply_snapshot(vec![order("a", OrderStatus::Preparing, 1, 2)]);
    polled.apply_event(&LiveMessage::Inserted {
        order: order("a", OrderStatus::Pending, 1, 1),
    });
    polled.apply_event(&status_event("a", OrderStatus::Preparing, 2));

    assert_eq!(pushed.orders(), polled.orders());
    assert_eq!(polled.get("a").unwrap().status, OrderStatus::Preparing);
}

#[test]
fn out_of_order_status_events_keep_newest() {
    let board = OrderBoard::new();
    board.upsert(order("a", OrderStatus::Pending, 1, 1));

    let newest = board.apply_event(&status_event("a", OrderStatus::Completed, 3));
    let late = board.apply_event(&status_event("a", OrderStatus::Preparing, 2));

    assert_eq!(
        newest,
        EventOutcome::Changed {
            order_id: "a".into(),
            change: BoardChange::Updated
        }
    );
    assert_eq!(
        late,
        EventOutcome::Changed {
            order_id: "a".into(),
            change: BoardChange::IgnoredStale
        }
    );
    assert_eq!(board.get("a").unwrap().status, OrderStatus::Completed);
}

#[test]
fn unknown_order_event_asks_for_fetch() {
    let board = OrderBoard::new();
    let outcome = board.apply_event(&status_event("late", OrderStatus::Preparing, 9));
    assert_eq!(outcome, EventOutcome::NeedsFetch("late".into()));
}

#[tokio::test]
async fn failed_status_change_rolls_back() {
    let board = OrderBoard::new();
    board.upsert(order("a", OrderStatus::Pending, 1, 1));
    let commands = FakeCommands {
        reject: true,
        ..Default::default()
    };

    let err = apply_status_change(&board, &commands, "a", OrderStatus::Completed)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Command {
            code: CommandErrorCode::InvalidTransition,
            ..
        }
    ));
    assert_eq!(board.get("a").unwrap().status, OrderStatus::Pending);
    assert!(!board.has_pending_edit("a"));
}

#[tokio::test]
async fn confirmed_status_change_sticks_until_remote_row() {
    let board = Arc::new(OrderBoard::new());
    board.upsert(order("a", OrderStatus::Pending, 1, 1));
    let commands = FakeCommands::default();

    let status = apply_status_change(&board, &commands, "a", OrderStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(status, OrderStatus::Cancelled);
    assert_eq!(
        commands.calls.lock().as_slice(),
        &[("a".to_string(), OrderStatus::Cancelled)]
    );
    assert_eq!(board.get("a").unwrap().status, OrderStatus::Cancelled);

    assert_eq!(board.get("a").unwrap().updated_at, WRITTEN_AT);

    // a later server event still wins
    board.apply_event(&status_event("a", OrderStatus::Cancelled, WRITTEN_AT + 2));
    assert_eq!(board.get("a").unwrap().updated_at, WRITTEN_AT + 2);
}

#[tokio::test]
async fn confirmed_change_survives_stale_poll() {
    let board = Arc::new(OrderBoard::new());
    board.upsert(order("a", OrderStatus::Pending, 1, 1));
    let commands = FakeCommands::default();

    apply_status_change(&board, &commands, "a", OrderStatus::Preparing)
        .await
        .unwrap();

    // a window read before the write lands afterwards
    let change = board.upsert(order("a", OrderStatus::Pending, 1, 1));

    assert_eq!(change, BoardChange::IgnoredStale);
    assert_eq!(board.get("a").unwrap().status, OrderStatus::Preparing);

    // the next window reflects the write
    let change = board.upsert(order("a", OrderStatus::Preparing, 1, WRITTEN_AT));
    assert_eq!(change, BoardChange::Unchanged);
}
