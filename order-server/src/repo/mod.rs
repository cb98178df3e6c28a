//! Repositories
//!
//! The ordering core reads the catalog and writes orders only through these
//! traits. Two implementations ship:
//! - [`MemoryStore`]: in-process maps (tests, local development)
//! - [`PgStore`]: PostgreSQL via sqlx

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;
use shared::models::{DiningTable, Discount, MenuItem, Restaurant};
use shared::order::{CommissionSummary, Order, OrderLineItem, OrderStatus};
use thiserror::Error;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    async fn find_restaurant(&self, id: &str) -> RepoResult<Option<Restaurant>>;
}

#[async_trait]
pub trait TableRepository: Send + Sync {
    async fn find_table(&self, id: &str) -> RepoResult<Option<DiningTable>>;
}

#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Menu items of `restaurant_id` among `ids`; unknown ids are simply absent
    async fn find_items(&self, restaurant_id: &str, ids: &[String]) -> RepoResult<Vec<MenuItem>>;
}

#[async_trait]
pub trait DiscountRepository: Send + Sync {
    /// Discounts flagged active for the restaurant (time window not applied)
    ///
    /// Malformed rows are logged and skipped.
    async fn active_discounts(&self, restaurant_id: &str) -> RepoResult<Vec<Discount>>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert_order(&self, order: &Order) -> RepoResult<()>;

    /// Order by id, scoped to its restaurant
    async fn find_order(&self, restaurant_id: &str, order_id: &str) -> RepoResult<Option<Order>>;

    /// Order by id regardless of restaurant (customer tracking)
    async fn find_order_by_id(&self, order_id: &str) -> RepoResult<Option<Order>>;

    /// Compare-and-set status write
    ///
    /// Updates only when the row matches `(order_id, restaurant_id, expected)`.
    /// Returns the updated order, or `None` when nothing matched.
    async fn compare_and_set_status(
        &self,
        restaurant_id: &str,
        order_id: &str,
        expected: OrderStatus,
        next: OrderStatus,
        updated_at: i64,
    ) -> RepoResult<Option<Order>>;

    /// Newest first, optionally filtered by status
    async fn list_recent(
        &self,
        restaurant_id: &str,
        status: Option<OrderStatus>,
        limit: usize,
    ) -> RepoResult<Vec<Order>>;

    /// Oldest first, all orders in any of `statuses`
    async fn list_by_statuses(
        &self,
        restaurant_id: &str,
        statuses: &[OrderStatus],
    ) -> RepoResult<Vec<Order>>;

    /// Every order of the restaurant (dashboard aggregates)
    async fn list_all(&self, restaurant_id: &str) -> RepoResult<Vec<Order>>;

    /// Commission billing per restaurant over non-cancelled orders created at or after `since`
    async fn commission_summary(&self, since: Option<i64>) -> RepoResult<Vec<CommissionSummary>>;
}

/// External inventory ledger
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    async fn consume(&self, restaurant_id: &str, lines: &[OrderLineItem]) -> RepoResult<()>;
    async fn restore(&self, restaurant_id: &str, lines: &[OrderLineItem]) -> RepoResult<()>;
}

/// All repositories the ordering core needs
#[derive(Clone)]
pub struct Repositories {
    pub restaurants: Arc<dyn RestaurantRepository>,
    pub tables: Arc<dyn TableRepository>,
    pub menu: Arc<dyn MenuRepository>,
    pub discounts: Arc<dyn DiscountRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub inventory: Arc<dyn InventoryLedger>,
}

impl Repositories {
    /// Back every repository with one store
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: RestaurantRepository
            + TableRepository
            + MenuRepository
            + DiscountRepository
            + OrderRepository
            + InventoryLedger
            + 'static,
    {
        Self {
            restaurants: store.clone(),
            tables: store.clone(),
            menu: store.clone(),
            discounts: store.clone(),
            orders: store.clone(),
            inventory: store,
        }
    }
}
