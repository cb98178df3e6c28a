//! LiveOrderHub: per-restaurant fan-out of order events
//!
//! ```text
//! OrderService (create / status write)
//!       │ LiveMessage::Inserted / StatusChanged
//!       ▼
//! LiveOrderHub
//!   └── restaurants: restaurant_id → broadcast::Sender<LiveMessage>
//!           │
//!           ▼
//!   Live WS handler (subscribe → forward)
//! ```
//!
//! Strictly isolated by restaurant. The hub keeps no order state: the
//! `ready` window a subscriber starts from is read from the order repository.

use std::sync::Arc;

use dashmap::DashMap;
use shared::order::LiveMessage;
use tokio::sync::broadcast;

/// Global live hub
#[derive(Clone, Debug)]
pub struct LiveOrderHub {
    restaurants: Arc<DashMap<String, broadcast::Sender<LiveMessage>>>,
    capacity: usize,
}

impl LiveOrderHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            restaurants: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Publish to every subscriber of the restaurant
    ///
    /// Returns the number of subscribers reached (0 when nobody listens).
    pub fn publish(&self, restaurant_id: &str, message: LiveMessage) -> usize {
        let Some(tx) = self.restaurants.get(restaurant_id) else {
            return 0;
        };
        let kind = message.kind();
        // send() only fails when there are no receivers
        match tx.send(message) {
            Ok(n) => {
                tracing::debug!(restaurant_id = %restaurant_id, kind, subscribers = n, "Live event published");
                n
            }
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self, restaurant_id: &str) -> broadcast::Receiver<LiveMessage> {
        self.restaurants
            .entry(restaurant_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn subscriber_count(&self, restaurant_id: &str) -> usize {
        self.restaurants
            .get(restaurant_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Drop the channel of a restaurant nobody listens to anymore
    pub fn release(&self, restaurant_id: &str) {
        self.restaurants
            .remove_if(restaurant_id, |_, tx| tx.receiver_count() == 0);
    }
}

impl Default for LiveOrderHub {
    fn default() -> Self {
        Self::new(256)
    }
}
