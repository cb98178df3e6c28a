//! PostgreSQL store
//!
//! Runtime-checked queries (`sqlx::query_as` + `bind`), line items as JSONB,
//! status writes as a single `UPDATE … WHERE status = $expected RETURNING`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{DiningTable, Discount, DiscountRow, MenuItem, Restaurant};
use shared::order::{CommissionSummary, Order, OrderLineItem, OrderStatus};
use sqlx::PgPool;
use sqlx::types::Json;

use super::{
    DiscountRepository, InventoryLedger, MenuRepository, OrderRepository, RepoError, RepoResult,
    RestaurantRepository, TableRepository,
};

const ORDER_COLUMNS: &str = "id, restaurant_id, table_id, table_name, items, subtotal, \
     discount_amount, applied_discount_id, total, commission_rate, commission_amount, status, \
     customer_name, notes, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run pending migrations
    pub async fn connect(database_url: &str) -> RepoResult<Self> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    restaurant_id: String,
    table_id: String,
    table_name: String,
    items: Json<Vec<OrderLineItem>>,
    subtotal: Decimal,
    discount_amount: Decimal,
    applied_discount_id: Option<String>,
    total: Decimal,
    commission_rate: Decimal,
    commission_amount: Decimal,
    status: String,
    customer_name: Option<String>,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepoError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e| RepoError::Corrupt(format!("order {}: {e}", row.id)))?;
        Ok(Order {
            id: row.id,
            restaurant_id: row.restaurant_id,
            table_id: row.table_id,
            table_name: row.table_name,
            items: row.items.0,
            subtotal: row.subtotal,
            discount_amount: row.discount_amount,
            applied_discount_id: row.applied_discount_id,
            total: row.total,
            commission_rate: row.commission_rate,
            commission_amount: row.commission_amount,
            status,
            customer_name: row.customer_name,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> RepoResult<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

#[derive(sqlx::FromRow)]
struct CommissionRow {
    restaurant_id: String,
    restaurant_name: String,
    order_count: i64,
    net_total: Decimal,
    commission_total: Decimal,
}

#[async_trait]
impl RestaurantRepository for PgStore {
    async fn find_restaurant(&self, id: &str) -> RepoResult<Option<Restaurant>> {
        let row: Option<Restaurant> =
            sqlx::query_as("SELECT id, name, commission_rate FROM restaurants WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row)
    }
}

#[async_trait]
impl TableRepository for PgStore {
    async fn find_table(&self, id: &str) -> RepoResult<Option<DiningTable>> {
        let row: Option<DiningTable> = sqlx::query_as(
            "SELECT id, restaurant_id, name, is_active FROM dining_tables WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl MenuRepository for PgStore {
    async fn find_items(&self, restaurant_id: &str, ids: &[String]) -> RepoResult<Vec<MenuItem>> {
        let rows: Vec<MenuItem> = sqlx::query_as(
            r#"
            SELECT id, restaurant_id, name, price, category, available
            FROM menu_items
            WHERE restaurant_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(restaurant_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl DiscountRepository for PgStore {
    async fn active_discounts(&self, restaurant_id: &str) -> RepoResult<Vec<Discount>> {
        let rows: Vec<DiscountRow> = sqlx::query_as(
            r#"
            SELECT id, restaurant_id, name, kind, value, apply_to, category_id, item_id,
                   start_time, end_time, is_active
            FROM discounts
            WHERE restaurant_id = $1 AND is_active
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

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
impl OrderRepository for PgStore {
    async fn insert_order(&self, order: &Order) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, restaurant_id, table_id, table_name, items, subtotal, discount_amount,
                applied_discount_id, total, commission_rate, commission_amount, status,
                customer_name, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(&order.id)
        .bind(&order.restaurant_id)
        .bind(&order.table_id)
        .bind(&order.table_name)
        .bind(Json(&order.items))
        .bind(order.subtotal)
        .bind(order.discount_amount)
        .bind(&order.applied_discount_id)
        .bind(order.total)
        .bind(order.commission_rate)
        .bind(order.commission_amount)
        .bind(order.status.as_str())
        .bind(&order.customer_name)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_order(&self, restaurant_id: &str, order_id: &str) -> RepoResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND restaurant_id = $2"
        ))
        .bind(order_id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn find_order_by_id(&self, order_id: &str) -> RepoResult<Option<Order>> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Order::try_from).transpose()
    }

    async fn compare_and_set_status(
        &self,
        restaurant_id: &str,
        order_id: &str,
        expected: OrderStatus,
        next: OrderStatus,
        updated_at: i64,
    ) -> RepoResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r#"
            UPDATE orders SET status = $4, updated_at = $5
            WHERE id = $1 AND restaurant_id = $2 AND status = $3
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(restaurant_id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list_recent(
        &self,
        restaurant_id: &str,
        status: Option<OrderStatus>,
        limit: usize,
    ) -> RepoResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE restaurant_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(restaurant_id)
        .bind(status.map(|s| s.as_str()))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        into_orders(rows)
    }

    async fn list_by_statuses(
        &self,
        restaurant_id: &str,
        statuses: &[OrderStatus],
    ) -> RepoResult<Vec<Order>> {
        let statuses: Vec<&str> = statuses.iter().map(OrderStatus::as_str).collect();
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE restaurant_id = $1 AND status = ANY($2)
            ORDER BY created_at ASC
            "#
        ))
        .bind(restaurant_id)
        .bind(&statuses)
        .fetch_all(&self.pool)
        .await?;
        into_orders(rows)
    }

    async fn list_all(&self, restaurant_id: &str) -> RepoResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE restaurant_id = $1"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        into_orders(rows)
    }

    async fn commission_summary(&self, since: Option<i64>) -> RepoResult<Vec<CommissionSummary>> {
        let rows: Vec<CommissionRow> = sqlx::query_as(
            r#"
            SELECT r.id AS restaurant_id,
                   r.name AS restaurant_name,
                   COUNT(o.id) AS order_count,
                   COALESCE(SUM(o.total), 0) AS net_total,
                   COALESCE(SUM(o.commission_amount), 0) AS commission_total
            FROM restaurants r
            LEFT JOIN orders o
              ON o.restaurant_id = r.id
             AND o.status <> 'cancelled'
             AND ($1::BIGINT IS NULL OR o.created_at >= $1)
            GROUP BY r.id, r.name
            ORDER BY r.name, r.id
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CommissionSummary {
                restaurant_id: r.restaurant_id,
                restaurant_name: r.restaurant_name,
                order_count: u64::try_from(r.order_count).unwrap_or(0),
                net_total: r.net_total,
                commission_total: r.commission_total,
            })
            .collect())
    }
}

#[async_trait]
impl InventoryLedger for PgStore {
    async fn consume(&self, restaurant_id: &str, lines: &[OrderLineItem]) -> RepoResult<()> {
        adjust_inventory(&self.pool, restaurant_id, lines, -1).await
    }

    async fn restore(&self, restaurant_id: &str, lines: &[OrderLineItem]) -> RepoResult<()> {
        adjust_inventory(&self.pool, restaurant_id, lines, 1).await
    }
}

/// Apply `sign × quantity` to every tracked line in one transaction
async fn adjust_inventory(
    pool: &PgPool,
    restaurant_id: &str,
    lines: &[OrderLineItem],
    sign: i64,
) -> RepoResult<()> {
    let mut tx = pool.begin().await?;
    for line in lines {
        sqlx::query(
            r#"
            UPDATE inventory SET quantity = quantity + $3
            WHERE restaurant_id = $1 AND menu_item_id = $2
            "#,
        )
        .bind(restaurant_id)
        .bind(&line.menu_item_id)
        .bind(sign * i64::from(line.quantity))
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}
