//! Order Client - HTTP and live-feed client for the order server
//!
//! Used by the restaurant dashboard, the kitchen display and the customer
//! pages.
//!
//! - [`OrderApi`]: HTTP commands and reads
//! - [`OrderFeed`] / [`LiveFeed`]: push events over WebSocket with polling fallback
//! - [`OrderBoard`]: reconciled local view of the restaurant's orders
//! - [`NotificationService`]: new-order detection and highlight state
//! - [`cart`]: indicative cart totals for the customer page

pub mod board;
pub mod cart;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod kv;
pub mod notify;

pub use board::{BoardChange, EventOutcome, OrderBoard, apply_status_change};
pub use cart::{Cart, CartLine, CartPreview, Tip};
pub use config::FeedConfig;
pub use error::{ClientError, ClientResult};
pub use feed::{Backoff, ConnectionState, FeedEvent, LiveFeed, OrderFeed, OrderSource};
pub use http::{ApiOrderSource, FeedKind, OrderApi, OrderCommands, StatusChange};
pub use kv::{JsonFileKvStore, KeyValueStore, MemoryKvStore};
pub use notify::NotificationService;

// Re-export shared types for convenience
pub use shared::order::{LiveMessage, Order, OrderStatus};
