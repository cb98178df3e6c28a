//! Live order feed over WebSocket
//!
//! `GET /api/live/ws?restaurant_id=...`
//!
//! ```text
//! connect ─► ready{orders}            (recent window)
//!        ─► inserted / status_changed (forwarded from LiveOrderHub)
//!        ─► ping every 30 s
//! lagged ─► ready{orders}             (fresh window replaces the gap)
//! ```
//!
//! Frames are JSON `LiveMessage` text frames. Clients upsert by order id, so
//! an event that also appears in a `ready` window is harmless.

use std::time::Duration;

use axum::{
    Router,
    body::Bytes,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use serde::Deserialize;
use shared::order::LiveMessage;
use tokio::sync::broadcast::error::RecvError;

use crate::core::ServerState;
use crate::utils::AppError;

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/live/ws", get(live_ws))
}

#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    #[serde(default)]
    pub restaurant_id: String,
}

async fn live_ws(
    ws: WebSocketUpgrade,
    State(state): State<ServerState>,
    Query(query): Query<LiveQuery>,
) -> Response {
    let restaurant_id = query.restaurant_id.trim().to_string();
    if restaurant_id.is_empty() {
        return AppError::scope_required().into_response();
    }
    ws.on_upgrade(move |socket| serve_socket(socket, state, restaurant_id))
}

type WsSender = SplitSink<WebSocket, Message>;

async fn send_message(sender: &mut WsSender, message: &LiveMessage) -> Result<(), axum::Error> {
    match serde_json::to_string(message) {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::error!(error = %e, kind = message.kind(), "Failed to encode live message");
            Ok(())
        }
    }
}

async fn send_ready(
    sender: &mut WsSender,
    state: &ServerState,
    restaurant_id: &str,
) -> Result<(), axum::Error> {
    let orders = match state.orders.recent_window(restaurant_id).await {
        Ok(orders) => orders,
        Err(e) => {
            tracing::warn!(restaurant_id = %restaurant_id, error = %e, "Failed to load live window");
            Vec::new()
        }
    };
    send_message(sender, &LiveMessage::Ready { orders }).await
}

async fn serve_socket(socket: WebSocket, state: ServerState, restaurant_id: String) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the window so no event falls in between
    let mut events = state.hub.subscribe(&restaurant_id);
    tracing::info!(restaurant_id = %restaurant_id, subscribers = state.hub.subscriber_count(&restaurant_id), "Live subscriber connected");

    if send_ready(&mut sender, &state, &restaurant_id).await.is_ok() {
        let mut ping = tokio::time::interval(PING_INTERVAL);
        ping.tick().await;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(message) => {
                        if send_message(&mut sender, &message).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(restaurant_id = %restaurant_id, skipped, "Live subscriber lagged, resending window");
                        if send_ready(&mut sender, &state, &restaurant_id).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                },
                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(restaurant_id = %restaurant_id, error = %e, "Live socket error");
                        break;
                    }
                },
                _ = ping.tick() => {
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    drop(events);
    state.hub.release(&restaurant_id);
    tracing::info!(restaurant_id = %restaurant_id, "Live subscriber disconnected");
}
