//! New-order notification state
//!
//! Lifecycle: `init(restaurant_id)` → `notify(order_id)` … → `teardown()`.
//!
//! De-duplication and highlighting are separate concerns:
//! - the notified set is persisted under `notified:{restaurant_id}`, keeps the
//!   most recent `cap` ids and survives reconnects and reloads
//! - a highlight lasts `highlight_ttl` and is never persisted

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::FeedConfig;
use crate::kv::KeyValueStore;
use crate::{ClientError, ClientResult};

#[derive(Debug, Default)]
struct NotifierState {
    restaurant_id: Option<String>,
    /// Oldest first
    order: VecDeque<String>,
    notified: HashSet<String>,
    highlights: HashMap<String, Instant>,
}

impl NotifierState {
    fn remember(&mut self, order_id: &str, cap: usize) -> bool {
        if !self.notified.insert(order_id.to_string()) {
            return false;
        }
        self.order.push_back(order_id.to_string());
        while self.order.len() > cap {
            if let Some(old) = self.order.pop_front() {
                self.notified.remove(&old);
            }
        }
        true
    }
}

/// Per-session notification service
pub struct NotificationService {
    store: Arc<dyn KeyValueStore>,
    cap: usize,
    highlight_ttl: Duration,
    state: Mutex<NotifierState>,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("NotificationService")
            .field("restaurant_id", &state.restaurant_id)
            .field("notified", &state.order.len())
            .field("highlighted", &state.highlights.len())
            .field("cap", &self.cap)
            .finish()
    }
}

fn storage_key(restaurant_id: &str) -> String {
    format!("notified:{restaurant_id}")
}

impl NotificationService {
    pub fn new(store: Arc<dyn KeyValueStore>, cap: usize, highlight_ttl: Duration) -> Self {
        Self {
            store,
            cap: cap.max(1),
            highlight_ttl,
            state: Mutex::new(NotifierState::default()),
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &FeedConfig) -> Self {
        Self::new(store, config.notified_cap, config.highlight_ttl)
    }

    /// Load the persisted notified set of a restaurant
    ///
    /// An unreadable entry starts the session with an empty set.
    pub fn init(&self, restaurant_id: &str) -> ClientResult<()> {
        let raw = self.store.get(&storage_key(restaurant_id))?;
        let ids: Vec<String> = match raw.as_deref().map(serde_json::from_str) {
            Some(Ok(ids)) => ids,
            Some(Err(e)) => {
                tracing::warn!(restaurant_id = %restaurant_id, error = %e, "Discarding corrupt notified set");
                Vec::new()
            }
            None => Vec::new(),
        };

        let mut state = self.state.lock();
        *state = NotifierState {
            restaurant_id: Some(restaurant_id.to_string()),
            ..Default::default()
        };
        for id in &ids {
            state.remember(id, self.cap);
        }
        tracing::debug!(restaurant_id = %restaurant_id, loaded = state.order.len(), "Notifier initialized");
        Ok(())
    }

    pub fn restaurant_id(&self) -> Option<String> {
        self.state.lock().restaurant_id.clone()
    }

    /// Record ids as already announced without highlighting them
    pub fn mark_seen<I, S>(&self, order_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut state = self.state.lock();
        if state.restaurant_id.is_none() {
            return;
        }
        let mut changed = false;
        for id in order_ids {
            changed |= state.remember(id.as_ref(), self.cap);
        }
        if changed {
            self.persist(&state);
        }
    }

    /// Announce an order; `true` only the first time the id is seen
    pub fn notify(&self, order_id: &str) -> bool {
        self.notify_at(order_id, Instant::now())
    }

    pub fn notify_at(&self, order_id: &str, now: Instant) -> bool {
        let mut state = self.state.lock();
        if state.restaurant_id.is_none() {
            tracing::warn!(order_id = %order_id, "notify() before init()");
            return false;
        }
        if !state.remember(order_id, self.cap) {
            return false;
        }
        let ttl = self.highlight_ttl;
        state
            .highlights
            .retain(|_, since| now.saturating_duration_since(*since) < ttl);
        state.highlights.insert(order_id.to_string(), now);
        self.persist(&state);
        true
    }

    pub fn is_notified(&self, order_id: &str) -> bool {
        self.state.lock().notified.contains(order_id)
    }

    pub fn is_highlighted(&self, order_id: &str) -> bool {
        self.is_highlighted_at(order_id, Instant::now())
    }

    pub fn is_highlighted_at(&self, order_id: &str, now: Instant) -> bool {
        self.state
            .lock()
            .highlights
            .get(order_id)
            .is_some_and(|since| now.saturating_duration_since(*since) < self.highlight_ttl)
    }

    /// Drop expired highlights; returns the ids that stopped glowing
    pub fn prune_highlights(&self) -> Vec<String> {
        self.prune_highlights_at(Instant::now())
    }

    pub fn prune_highlights_at(&self, now: Instant) -> Vec<String> {
        let ttl = self.highlight_ttl;
        let mut expired = Vec::new();
        self.state.lock().highlights.retain(|id, since| {
            let keep = now.saturating_duration_since(*since) < ttl;
            if !keep {
                expired.push(id.clone());
            }
            keep
        });
        expired
    }

    /// End the session; the persisted set stays for the next `init`
    pub fn teardown(&self) {
        let mut state = self.state.lock();
        if let Some(restaurant_id) = state.restaurant_id.take() {
            tracing::debug!(restaurant_id = %restaurant_id, "Notifier torn down");
        }
        *state = NotifierState::default();
    }

    fn persist(&self, state: &NotifierState) {
        let Some(restaurant_id) = state.restaurant_id.as_deref() else {
            return;
        };
        let ids: Vec<&String> = state.order.iter().collect();
        let result = serde_json::to_string(&ids)
            .map_err(ClientError::from)
            .and_then(|json| self.store.set(&storage_key(restaurant_id), &json));
        if let Err(e) = result {
            tracing::warn!(restaurant_id = %restaurant_id, error = %e, "Failed to persist notified set");
        }
    }
}
