//! Live order feed: push events with polling fallback
//!
//! ```text
//! connecting ──▶ live ◀──▶ reconnecting
//!      └──────────────────────▲
//! any ──close()──▶ offline
//! ```
//!
//! While `live`, WebSocket frames drive the [`OrderBoard`] and a slow
//! reconciliation poll runs alongside. Otherwise the full window is polled at
//! `poll_interval`, both while a connect attempt is pending and while the
//! reconnect backoff elapses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use shared::order::{LiveMessage, Order};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use crate::board::{BoardChange, EventOutcome, OrderBoard};
use crate::config::FeedConfig;
use crate::{ClientError, ClientResult};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Connection state of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Live,
    Reconnecting,
    /// Closed by the owner; terminal
    Offline,
}

impl ConnectionState {
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Connecting, Live)
                | (Connecting, Reconnecting)
                | (Live, Reconnecting)
                | (Reconnecting, Live)
                | (Connecting | Live | Reconnecting, Offline)
        )
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Poll period in this state; `None` once offline
    pub fn poll_interval(&self, config: &FeedConfig) -> Option<Duration> {
        match self {
            Self::Live => Some(config.reconcile_interval),
            Self::Connecting | Self::Reconnecting => Some(config.poll_interval),
            Self::Offline => None,
        }
    }
}

/// Exponential reconnect delay
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            current: initial,
        }
    }

    /// Delay to wait now; doubles the next one up to the cap
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Events published to feed subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// An order the board did not hold before
    OrderInserted(Order),
    /// Board content changed
    BoardUpdated,
    StateChanged(ConnectionState),
}

/// Where a feed reads the full window and single orders from
#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn fetch_window(&self) -> ClientResult<Vec<Order>>;
    async fn fetch_order(&self, order_id: &str) -> ClientResult<Order>;
}

/// Push + poll behind one interface
#[async_trait]
pub trait OrderFeed: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<FeedEvent>;
    /// Fetch the full window now, whatever the connection state
    async fn refresh_now(&self) -> ClientResult<()>;
    fn state(&self) -> ConnectionState;
    fn close(&self);
}

struct FeedShared {
    board: Arc<OrderBoard>,
    source: Arc<dyn OrderSource>,
    events: broadcast::Sender<FeedEvent>,
    state: Mutex<ConnectionState>,
    config: FeedConfig,
}

impl FeedShared {
    fn set_state(&self, next: ConnectionState) {
        {
            let mut state = self.state.lock();
            if *state == next {
                return;
            }
            if !state.can_transition_to(next) {
                let from = *state;
                tracing::debug!(from = ?from, to = ?next, "Ignoring feed state change");
                return;
            }
            *state = next;
        }
        tracing::info!(state = ?next, "Feed state changed");
        let _ = self.events.send(FeedEvent::StateChanged(next));
    }

    fn publish_changes(&self, changes: impl IntoIterator<Item = (String, BoardChange)>) {
        let mut updated = false;
        for (order_id, change) in changes {
            if change == BoardChange::Inserted
                && let Some(order) = self.board.get(&order_id)
            {
                let _ = self.events.send(FeedEvent::OrderInserted(order));
            }
            updated |= change.is_change();
        }
        if updated {
            let _ = self.events.send(FeedEvent::BoardUpdated);
        }
    }

    async fn poll(&self) -> ClientResult<()> {
        let orders = self.source.fetch_window().await?;
        tracing::debug!(orders = orders.len(), "Feed window polled");
        self.merge(orders);
        Ok(())
    }

    fn merge(&self, orders: Vec<Order>) {
        let changes: Vec<(String, BoardChange)> = orders
            .into_iter()
            .map(|order| {
                let id = order.id.clone();
                (id, self.board.upsert(order))
            })
            .collect();
        self.publish_changes(changes);
    }

    async fn handle_message(&self, message: LiveMessage) {
        if let LiveMessage::Ready { orders } = message {
            self.merge(orders);
            return;
        }
        match self.board.apply_event(&message) {
            EventOutcome::Snapshot { inserted } => {
                self.publish_changes(inserted.into_iter().map(|id| (id, BoardChange::Inserted)));
            }
            EventOutcome::Changed { order_id, change } => {
                self.publish_changes([(order_id, change)]);
            }
            EventOutcome::NeedsFetch(order_id) => match self.source.fetch_order(&order_id).await {
                Ok(order) => {
                    let change = self.board.upsert(order);
                    self.publish_changes([(order_id, change)]);
                }
                Err(e) => {
                    tracing::warn!(order_id = %order_id, error = %e, "Failed to fetch order for status event");
                }
            },
        }
    }
}

/// WebSocket-backed [`OrderFeed`]
pub struct LiveFeed {
    shared: Arc<FeedShared>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for LiveFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFeed")
            .field("state", &*self.shared.state.lock())
            .field("orders", &self.shared.board.len())
            .finish()
    }
}

impl LiveFeed {
    /// Start the feed task; must be called inside a tokio runtime
    pub fn spawn(
        ws_url: impl Into<String>,
        source: Arc<dyn OrderSource>,
        board: Arc<OrderBoard>,
        config: FeedConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let shared = Arc::new(FeedShared {
            board,
            source,
            events,
            state: Mutex::new(ConnectionState::Connecting),
            config,
        });
        let shutdown = CancellationToken::new();
        let worker = FeedWorker {
            url: ws_url.into(),
            shared: shared.clone(),
            shutdown: shutdown.clone(),
        };
        let task = tokio::spawn(worker.run());
        Self {
            shared,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn board(&self) -> &Arc<OrderBoard> {
        &self.shared.board
    }

    /// Close and wait for the task to finish
    pub async fn shutdown(&self) {
        self.close();
        let task = self.task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "Feed task ended abnormally");
        }
    }
}

#[async_trait]
impl OrderFeed for LiveFeed {
    fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.shared.events.subscribe()
    }

    async fn refresh_now(&self) -> ClientResult<()> {
        self.shared.poll().await
    }

    fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    fn close(&self) {
        self.shutdown.cancel();
        self.shared.set_state(ConnectionState::Offline);
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct FeedWorker {
    url: String,
    shared: Arc<FeedShared>,
    shutdown: CancellationToken,
}

impl FeedWorker {
    async fn run(self) {
        tracing::info!(url = %self.url, "Live feed started");
        let config = &self.shared.config;
        let mut backoff = Backoff::new(config.initial_backoff, config.max_backoff);

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            let Some(connect) = self.connect_polling().await else {
                break;
            };
            match connect {
                Ok(ws) => {
                    backoff.reset();
                    self.shared.set_state(ConnectionState::Live);
                    self.run_session(ws).await;
                    if self.shutdown.is_cancelled() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Live feed connection failed, polling");
                }
            }
            self.shared.set_state(ConnectionState::Reconnecting);

            // Poll while waiting to reconnect
            let deadline = Instant::now() + backoff.next_delay();
            if !self.poll_until(deadline).await {
                break;
            }
        }

        self.shared.set_state(ConnectionState::Offline);
        tracing::info!("Live feed stopped");
    }

    /// Connect within `connect_timeout`, polling at `poll_interval` meanwhile
    ///
    /// `None` on shutdown.
    async fn connect_polling(&self) -> Option<ClientResult<WsStream>> {
        let config = &self.shared.config;
        let connect = tokio::time::timeout(
            config.connect_timeout,
            tokio_tungstenite::connect_async(self.url.as_str()),
        );
        tokio::pin!(connect);
        let mut ticker = tokio::time::interval(config.poll_interval);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return None,
                result = &mut connect => {
                    return Some(match result {
                        Ok(Ok((ws, _response))) => Ok(ws),
                        Ok(Err(e)) => Err(e.into()),
                        Err(_) => Err(ClientError::WebSocket(
                            tungstenite::Error::Io(std::io::Error::new(
                                std::io::ErrorKind::TimedOut,
                                "handshake timed out",
                            )),
                        )),
                    });
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.shared.poll().await {
                        tracing::warn!(error = %e, "Feed poll failed");
                    }
                }
            }
        }
    }

    /// Poll at `poll_interval` until `deadline`; `false` on shutdown
    async fn poll_until(&self, deadline: Instant) -> bool {
        let interval = self.shared.config.poll_interval;
        loop {
            if let Err(e) = self.shared.poll().await {
                tracing::warn!(error = %e, "Feed poll failed");
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let wake = (now + interval).min(deadline);
            tokio::select! {
                _ = self.shutdown.cancelled() => return false,
                _ = tokio::time::sleep_until(wake) => {}
            }
            if Instant::now() >= deadline {
                return true;
            }
        }
    }

    async fn run_session<S>(&self, ws: tokio_tungstenite::WebSocketStream<S>)
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    {
        let (mut ws_sink, mut ws_stream) = ws.split();

        let mut reconcile = tokio::time::interval(self.shared.config.reconcile_interval);
        reconcile.tick().await; // skip immediate tick, `ready` carries the window

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    let _ = ws_sink.close().await;
                    return;
                }

                _ = reconcile.tick() => {
                    if let Err(e) = self.shared.poll().await {
                        tracing::warn!(error = %e, "Reconciliation poll failed");
                    }
                }

                msg = ws_stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<LiveMessage>(&text) {
                                Ok(message) => self.shared.handle_message(message).await,
                                Err(e) => tracing::warn!(error = %e, "Invalid live message"),
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = ws_sink.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::info!("Live feed closed by server");
                            return;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Live feed error");
                            return;
                        }
                        None => {
                            tracing::info!("Live feed stream ended");
                            return;
                        }
                        _ => {} // Binary, Pong
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    #[test]
    fn test_state_transitions() {
        assert!(Connecting.can_transition_to(Live));
        assert!(Connecting.can_transition_to(Reconnecting));
        assert!(Live.can_transition_to(Reconnecting));
        assert!(Reconnecting.can_transition_to(Live));
        for s in [Connecting, Live, Reconnecting] {
            assert!(s.can_transition_to(Offline));
        }

        assert!(!Live.can_transition_to(Connecting));
        assert!(!Reconnecting.can_transition_to(Connecting));
        for s in [Connecting, Live, Reconnecting, Offline] {
            assert!(!Offline.can_transition_to(s));
        }
    }

    #[test]
    fn test_poll_interval_by_state() {
        let config = FeedConfig::kitchen();
        assert_eq!(Connecting.poll_interval(&config), Some(Duration::from_secs(3)));
        assert_eq!(Reconnecting.poll_interval(&config), Some(Duration::from_secs(3)));
        assert_eq!(Live.poll_interval(&config), Some(Duration::from_secs(60)));
        assert_eq!(Offline.poll_interval(&config), None);
    }

    #[test]
    fn test_backoff_doubles_to_cap_and_resets() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(5));
        let delays: Vec<u64> = (0..5).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 5, 5]);
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}
