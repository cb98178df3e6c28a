use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use order_client::{
    ClientError, ClientResult, ConnectionState, FeedConfig, LiveFeed, LiveMessage, Order,
    OrderBoard, OrderFeed, OrderSource, OrderStatus,
};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

fn order(id: &str, status: OrderStatus, updated_at: i64) -> Order {
    Order {
        id: id.into(),
        restaurant_id: "r1".into(),
        table_id: "t1".into(),
        table_name: "Table 1".into(),
        items: vec![],
        subtotal: dec!(12.00),
        discount_amount: dec!(0),
        applied_discount_id: None,
        total: dec!(12.00),
        commission_rate: dec!(0.05),
        commission_amount: dec!(0.60),
        status,
        customer_name: None,
        notes: None,
        created_at: 1,
        updated_at,
    }
}

#[derive(Default)]
struct FakeSource {
    window: Mutex<Vec<Order>>,
    orders: Mutex<HashMap<String, Order>>,
    fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl OrderSource for FakeSource {
    async fn fetch_window(&self) -> ClientResult<Vec<Order>> {
        Ok(self.window.lock().clone())
    }

    async fn fetch_order(&self, order_id: &str) -> ClientResult<Order> {
        self.fetched.lock().push(order_id.to_string());
        self.orders
            .lock()
            .get(order_id)
            .cloned()
            .ok_or_else(|| ClientError::InvalidResponse(format!("no order {order_id}")))
    }
}

fn fast_config() -> FeedConfig {
    FeedConfig::kitchen()
        .with_poll_interval(Duration::from_millis(20))
        .with_backoff(Duration::from_millis(50), Duration::from_millis(100))
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn unreachable_push_falls_back_to_polling() {
    let source = Arc::new(FakeSource::default());
    source
        .window
        .lock()
        .push(order("a", OrderStatus::Pending, 1));
    let board = Arc::new(OrderBoard::new());

    let feed = LiveFeed::spawn(
        "ws://127.0.0.1:1/api/live/ws?restaurant_id=r1",
        source.clone(),
        board.clone(),
        fast_config(),
    );

    wait_until(|| board.contains("a")).await;
    wait_until(|| feed.state() == ConnectionState::Reconnecting).await;

    // a later poll picks up new rows too
    source
        .window
        .lock()
        .push(order("b", OrderStatus::Pending, 2));
    wait_until(|| board.contains("b")).await;

    feed.shutdown().await;
    assert_eq!(feed.state(), ConnectionState::Offline);
}

#[tokio::test]
async fn stalled_handshake_still_polls_and_times_out() {
    // accepts TCP, never answers the WebSocket handshake
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let source = Arc::new(FakeSource::default());
    source
        .window
        .lock()
        .push(order("a", OrderStatus::Pending, 1));
    let board = Arc::new(OrderBoard::new());

    let feed = LiveFeed::spawn(
        format!("ws://{addr}/api/live/ws?restaurant_id=r1"),
        source.clone(),
        board.clone(),
        fast_config().with_connect_timeout(Duration::from_millis(200)),
    );

    wait_until(|| board.contains("a")).await;
    wait_until(|| feed.state() == ConnectionState::Reconnecting).await;

    feed.shutdown().await;
    assert_eq!(feed.state(), ConnectionState::Offline);
}

#[tokio::test]
async fn push_events_drive_the_board() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let frames = [
            LiveMessage::Ready {
                orders: vec![order("a", OrderStatus::Pending, 1)],
            },
            LiveMessage::StatusChanged {
                order_id: "b".into(),
                status: OrderStatus::Preparing,
                updated_at: 7,
            },
        ];
        for frame in frames {
            let json = serde_json::to_string(&frame).unwrap();
            ws.send(Message::Text(json.into())).await.unwrap();
        }
        // hold the session open until the client leaves
        while let Some(Ok(_)) = ws.next().await {}
    });

    let source = Arc::new(FakeSource::default());
    source
        .orders
        .lock()
        .insert("b".into(), order("b", OrderStatus::Preparing, 7));
    let board = Arc::new(OrderBoard::new());

    let feed = LiveFeed::spawn(
        format!("ws://{addr}/api/live/ws?restaurant_id=r1"),
        source.clone(),
        board.clone(),
        fast_config(),
    );

    wait_until(|| board.contains("a") && board.contains("b")).await;
    assert_eq!(feed.state(), ConnectionState::Live);
    assert_eq!(source.fetched.lock().as_slice(), &["b".to_string()]);
    assert_eq!(board.get("b").unwrap().status, OrderStatus::Preparing);

    feed.close();
    assert_eq!(feed.state(), ConnectionState::Offline);
    feed.shutdown().await;
}

#[tokio::test]
async fn refresh_now_publishes_inserted_orders() {
    let source = Arc::new(FakeSource::default());
    let board = Arc::new(OrderBoard::new());
    let feed = LiveFeed::spawn(
        "ws://127.0.0.1:1/api/live/ws?restaurant_id=r1",
        source.clone(),
        board.clone(),
        FeedConfig::dashboard(),
    );
    let mut events = feed.subscribe();

    source
        .window
        .lock()
        .push(order("new", OrderStatus::Pending, 1));
    feed.refresh_now().await.unwrap();

    let inserted = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(order_client::FeedEvent::OrderInserted(order)) => return order,
                Ok(_) => continue,
                Err(e) => panic!("feed closed: {e}"),
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(inserted.id, "new");

    feed.shutdown().await;
}
