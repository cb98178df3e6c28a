//! In-memory store
//!
//! Backs every repository trait with `parking_lot` guarded maps. Locks are
//! never held across an `.await`. Fault switches let tests exercise the
//! degraded paths (discount read failure, inventory failure, failed insert).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use shared::models::{DiningTable, Discount, DiscountRow, MenuItem, Restaurant};
use shared::order::{CommissionSummary, Order, OrderLineItem, OrderStatus};

use super::{
    DiscountRepository, InventoryLedger, MenuRepository, OrderRepository, RepoError, RepoResult,
    RestaurantRepository, TableRepository,
};

#[derive(Default)]
struct Faults {
    discount_reads: AtomicBool,
    inventory: AtomicBool,
    order_writes: AtomicBool,
}

#[derive(Default)]
pub struct MemoryStore {
    restaurants: RwLock<HashMap<String, Restaurant>>,
    tables: RwLock<HashMap<String, DiningTable>>,
    menu: RwLock<HashMap<String, MenuItem>>,
    discounts: RwLock<Vec<DiscountRow>>,
    /// Insertion order == creation order
    orders: RwLock<Vec<Order>>,
    /// (restaurant_id, menu_item_id) -> units on hand
    stock: RwLock<HashMap<(String, String), i64>>,
    /// Status forced onto an order right before its next compare-and-set
    interposed: Mutex<HashMap<String, OrderStatus>>,
    faults: Faults,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Seeding ==========

    pub fn upsert_restaurant(&self, restaurant: Restaurant) {
        self.restaurants
            .write()
            .insert(restaurant.id.clone(), restaurant);
    }

    pub fn upsert_table(&self, table: DiningTable) {
        self.tables.write().insert(table.id.clone(), table);
    }

    pub fn upsert_menu_item(&self, item: MenuItem) {
        self.menu.write().insert(item.id.clone(), item);
    }

    pub fn set_item_available(&self, item_id: &str, available: bool) {
        if let Some(item) = self.menu.write().get_mut(item_id) {
            item.available = available;
        }
    }

    pub fn upsert_discount(&self, discount: &Discount) {
        self.insert_discount_row(DiscountRow::from(discount));
    }

    /// Store a raw row as it would sit in the database (may be malformed)
    pub fn insert_discount_row(&self, row: DiscountRow) {
        let mut rows = self.discounts.write();
        rows.retain(|r| r.id != row.id);
        rows.push(row);
    }

    pub fn set_stock(&self, restaurant_id: &str, item_id: &str, units: i64) {
        self.stock
            .write()
            .insert((restaurant_id.to_string(), item_id.to_string()), units);
    }

    pub fn stock(&self, restaurant_id: &str, item_id: &str) -> Option<i64> {
        self.stock
            .read()
            .get(&(restaurant_id.to_string(), item_id.to_string()))
            .copied()
    }

    pub fn order_count(&self) -> usize {
        self.orders.read().len()
    }

    // ========== Fault injection ==========

    pub fn fail_discount_reads(&self, fail: bool) {
        self.faults.discount_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_inventory(&self, fail: bool) {
        self.faults.inventory.store(fail, Ordering::SeqCst);
    }

    pub fn fail_order_writes(&self, fail: bool) {
        self.faults.order_writes.store(fail, Ordering::SeqCst);
    }

    /// Simulate a concurrent writer: before the next compare-and-set on
    /// `order_id`, its stored status is changed to `status`.
    pub fn interpose_status_change(&self, order_id: &str, status: OrderStatus) {
        self.interposed.lock().insert(order_id.to_string(), status);
    }

    fn check_fault(flag: &AtomicBool, what: &str) -> RepoResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable(format!("{what} unavailable")));
        }
        Ok(())
    }

    fn adjust_stock(&self, restaurant_id: &str, lines: &[OrderLineItem], sign: i64) {
        let mut stock = self.stock.write();
        for line in lines {
            // Untracked items have no ledger row
            if let Some(units) =
                stock.get_mut(&(restaurant_id.to_string(), line.menu_item_id.clone()))
            {
                *units += sign * i64::from(line.quantity);
            }
        }
    }
}

#[async_trait]
impl RestaurantRepository for MemoryStore {
    async fn find_restaurant(&self, id: &str) -> RepoResult<Option<Restaurant>> {
        Ok(self.restaurants.read().get(id).cloned())
    }
}

#[async_trait]
impl TableRepository for MemoryStore {
    async fn find_table(&self, id: &str) -> RepoResult<Option<DiningTable>> {
        Ok(self.tables.read().get(id).cloned())
    }
}

#[async_trait]
impl MenuRepository for MemoryStore {
    async fn find_items(&self, restaurant_id: &str, ids: &[String]) -> RepoResult<Vec<MenuItem>> {
        let menu = self.menu.read();
        Ok(ids
            .iter()
            .filter_map(|id| menu.get(id))
            .filter(|item| item.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DiscountRepository for MemoryStore {
    async fn active_discounts(&self, restaurant_id: &str) -> RepoResult<Vec<Discount>> {
        Self::check_fault(&self.faults.discount_reads, "discounts")?;
        let rows: Vec<DiscountRow> = self
            .discounts
            .read()
            .iter()
            .filter(|r| r.restaurant_id == restaurant_id && r.is_active)
            .cloned()
            .collect();

        let mut discounts = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match Discount::try_from(row) {
                Ok(d) => discounts.push(d),
                Err(e) => {
                    tracing::warn!(discount_id = %id, restaurant_id = %restaurant_id, error = %e, "Skipping malformed discount row");
                }
            }
        }
        Ok(discounts)
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert_order(&self, order: &Order) -> RepoResult<()> {
        Self::check_fault(&self.faults.order_writes, "orders")?;
        let mut orders = self.orders.write();
        if orders.iter().any(|o| o.id == order.id) {
            return Err(RepoError::Corrupt(format!("duplicate order id {}", order.id)));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn find_order(&self, restaurant_id: &str, order_id: &str) -> RepoResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .iter()
            .find(|o| o.id == order_id && o.restaurant_id == restaurant_id)
            .cloned())
    }

    async fn find_order_by_id(&self, order_id: &str) -> RepoResult<Option<Order>> {
        Ok(self.orders.read().iter().find(|o| o.id == order_id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        restaurant_id: &str,
        order_id: &str,
        expected: OrderStatus,
        next: OrderStatus,
        updated_at: i64,
    ) -> RepoResult<Option<Order>> {
        Self::check_fault(&self.faults.order_writes, "orders")?;
        let interposed = self.interposed.lock().remove(order_id);

        let mut orders = self.orders.write();
        let Some(order) = orders
            .iter_mut()
            .find(|o| o.id == order_id && o.restaurant_id == restaurant_id)
        else {
            return Ok(None);
        };

        if let Some(status) = interposed {
            order.status = status;
            order.updated_at += 1;
        }
        if order.status != expected {
            return Ok(None);
        }
        order.status = next;
        order.updated_at = updated_at;
        Ok(Some(order.clone()))
    }

    async fn list_recent(
        &self,
        restaurant_id: &str,
        status: Option<OrderStatus>,
        limit: usize,
    ) -> RepoResult<Vec<Order>> {
        let mut result: Vec<Order> = self
            .orders
            .read()
            .iter()
            .rev()
            .filter(|o| o.restaurant_id == restaurant_id)
            .filter(|o| status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result.truncate(limit);
        Ok(result)
    }

    async fn list_by_statuses(
        &self,
        restaurant_id: &str,
        statuses: &[OrderStatus],
    ) -> RepoResult<Vec<Order>> {
        let mut result: Vec<Order> = self
            .orders
            .read()
            .iter()
            .filter(|o| o.restaurant_id == restaurant_id && statuses.contains(&o.status))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    async fn list_all(&self, restaurant_id: &str) -> RepoResult<Vec<Order>> {
        Ok(self
            .orders
            .read()
            .iter()
            .filter(|o| o.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn commission_summary(&self, since: Option<i64>) -> RepoResult<Vec<CommissionSummary>> {
        let restaurants: Vec<Restaurant> = self.restaurants.read().values().cloned().collect();
        let orders = self.orders.read();

        let mut summary: Vec<CommissionSummary> = restaurants
            .into_iter()
            .map(|r| {
                let billable = orders.iter().filter(|o| {
                    o.restaurant_id == r.id
                        && o.status != OrderStatus::Cancelled
                        && since.is_none_or(|s| o.created_at >= s)
                });
                let mut line = CommissionSummary {
                    restaurant_id: r.id.clone(),
                    restaurant_name: r.name,
                    order_count: 0,
                    net_total: Decimal::ZERO,
                    commission_total: Decimal::ZERO,
                };
                for o in billable {
                    line.order_count += 1;
                    line.net_total += o.total;
                    line.commission_total += o.commission_amount;
                }
                line
            })
            .collect();
        summary.sort_by(|a, b| {
            a.restaurant_name
                .cmp(&b.restaurant_name)
                .then_with(|| a.restaurant_id.cmp(&b.restaurant_id))
        });
        Ok(summary)
    }
}

#[async_trait]
impl InventoryLedger for MemoryStore {
    async fn consume(&self, restaurant_id: &str, lines: &[OrderLineItem]) -> RepoResult<()> {
        Self::check_fault(&self.faults.inventory, "inventory")?;
        self.adjust_stock(restaurant_id, lines, -1);
        Ok(())
    }

    async fn restore(&self, restaurant_id: &str, lines: &[OrderLineItem]) -> RepoResult<()> {
        Self::check_fault(&self.faults.inventory, "inventory")?;
        self.adjust_stock(restaurant_id, lines, 1);
        Ok(())
    }
}
