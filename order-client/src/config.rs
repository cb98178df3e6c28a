//! Live feed configuration

use std::time::Duration;

/// Timing and sizing of a [`crate::LiveFeed`] session
///
/// | Field | Dashboard | Kitchen |
/// |-------|-----------|---------|
/// | poll_interval (while not live) | 10 s | 3 s |
/// | reconcile_interval (while live) | 60 s | 60 s |
/// | connect_timeout | 10 s | 10 s |
/// | reconnect backoff | 1 s → 30 s | 1 s → 30 s |
/// | highlight_ttl | 120 s | 120 s |
/// | notified_cap | 200 | 200 |
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Full-window poll while push events are unavailable
    pub poll_interval: Duration,
    /// Slow reconciliation poll while live
    pub reconcile_interval: Duration,
    /// WebSocket connect plus handshake; polling continues meanwhile
    pub connect_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// How long a new order stays highlighted
    pub highlight_ttl: Duration,
    /// Most recent notified order ids kept across sessions
    pub notified_cap: usize,
    /// Buffer of the feed's event channel
    pub event_capacity: usize,
}

impl FeedConfig {
    /// Restaurant dashboard preset
    pub fn dashboard() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            reconcile_interval: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            highlight_ttl: Duration::from_secs(120),
            notified_cap: 200,
            event_capacity: 256,
        }
    }

    /// Kitchen display preset
    pub fn kitchen() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            ..Self::dashboard()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_reconcile_interval(mut self, interval: Duration) -> Self {
        self.reconcile_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::dashboard()
    }
}
