//! OrderService - order creation, status transitions and order reads
//!
//! # Create Flow
//!
//! ```text
//! create_order(req)
//!     ├─ 1. Validate input (before any read)
//!     ├─ 2. Resolve table (must exist and be active)
//!     ├─ 3. Fetch menu items for the distinct requested ids
//!     ├─ 4. Availability gate
//!     ├─ 5. Re-price every line from the catalog
//!     ├─ 6. Subtotal
//!     ├─ 7. Load active discounts (read failure → no discount) and resolve
//!     ├─ 8. Final pricing with the restaurant commission rate
//!     ├─ 9. Single insert (status pending)
//!     ├─ 10. Publish inserted, consume inventory, invalidate dashboard
//!     └─ 11. Return order id
//! ```
//!
//! Steps 1-8 are shared with [`OrderService::preview_order_pricing`], so a
//! preview always matches what a create would charge at the same instant.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use shared::models::{DiningTable, MenuItem};
use shared::order::{
    CartLineInput, CommissionSummary, CreateOrderRequest, DashboardStats, LiveMessage, Order,
    OrderLineItem, OrderStatus, OrderTracking, PreviewOrderRequest, PricingPreview,
    TransitionCheck,
};
use shared::util::{new_id, now_millis};

use super::error::{OrderError, OrderResult};
use crate::core::Config;
use crate::dashboard::DashboardCache;
use crate::live::LiveOrderHub;
use crate::pricing::{
    self, DiscountResolution, PricingBreakdown, PricingLine, compute_pricing,
    matcher::DiscountLine, resolve_best_discount,
};
use crate::repo::Repositories;
use crate::utils::validation::{
    MAX_CUSTOMER_NAME_LEN, MAX_NOTES_LEN, normalize_optional_text, validate_cart_lines,
    validate_optional_text, validate_required_text,
};

/// Compare-and-set attempts before a status write gives up
const MAX_CAS_ATTEMPTS: usize = 3;

/// Hard cap on list reads regardless of the requested limit
const MAX_LIST_LIMIT: usize = 500;

/// Tunables taken from [`Config`]
#[derive(Debug, Clone)]
pub struct OrderSettings {
    pub default_commission_rate: Decimal,
    pub recent_orders_limit: usize,
    pub kitchen_completed_tail: usize,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for OrderSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_commission_rate: config.default_commission_rate,
            recent_orders_limit: config.recent_orders_limit.max(1),
            kitchen_completed_tail: config.kitchen_completed_tail,
        }
    }
}

/// Priced cart, not yet persisted
struct Quote {
    table: DiningTable,
    lines: Vec<OrderLineItem>,
    resolution: DiscountResolution,
    breakdown: PricingBreakdown,
}

/// Outcome of one status write
struct Transition {
    order: Order,
    changed: bool,
}

#[derive(Clone)]
pub struct OrderService {
    repos: Repositories,
    hub: LiveOrderHub,
    dashboard: DashboardCache,
    settings: OrderSettings,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("repos", &"<Repositories>")
            .field("settings", &self.settings)
            .finish()
    }
}

impl OrderService {
    pub fn new(
        repos: Repositories,
        hub: LiveOrderHub,
        dashboard: DashboardCache,
        settings: OrderSettings,
    ) -> Self {
        Self {
            repos,
            hub,
            dashboard,
            settings,
        }
    }

    pub fn hub(&self) -> &LiveOrderHub {
        &self.hub
    }

    pub fn settings(&self) -> &OrderSettings {
        &self.settings
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Place an order for a table. Returns the new order id.
    pub async fn create_order(&self, req: CreateOrderRequest) -> OrderResult<String> {
        validate_required_text(&req.table_id, "table_id")?;
        validate_cart_lines(&req.items)?;
        validate_optional_text(
            req.customer_name.as_deref(),
            "customer_name",
            MAX_CUSTOMER_NAME_LEN,
        )?;
        validate_optional_text(req.notes.as_deref(), "notes", MAX_NOTES_LEN)?;

        let now = now_millis();
        let quote = self.quote(req.table_id.trim(), &req.items, now).await?;
        let Quote {
            table,
            lines,
            resolution,
            breakdown,
        } = quote;

        let order = Order {
            id: new_id(),
            restaurant_id: table.restaurant_id.clone(),
            table_id: table.id.clone(),
            table_name: table.name.clone(),
            items: lines,
            subtotal: breakdown.subtotal,
            discount_amount: breakdown.discount_amount,
            applied_discount_id: resolution.applied_discount_id,
            total: breakdown.total,
            commission_rate: breakdown.commission_rate,
            commission_amount: breakdown.commission_amount,
            status: OrderStatus::Pending,
            customer_name: normalize_optional_text(req.customer_name),
            notes: normalize_optional_text(req.notes),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.repos.orders.insert_order(&order).await {
            tracing::error!(restaurant_id = %order.restaurant_id, table_id = %order.table_id, error = %e, "Failed to insert order");
            return Err(e.into());
        }

        tracing::info!(
            order_id = %order.id,
            restaurant_id = %order.restaurant_id,
            table_id = %order.table_id,
            lines = order.items.len(),
            total = %order.total,
            discount_id = ?order.applied_discount_id,
            "Order created"
        );

        let order_id = order.id.clone();
        let restaurant_id = order.restaurant_id.clone();
        let items = order.items.clone();

        self.hub
            .publish(&restaurant_id, LiveMessage::Inserted { order });
        if let Err(e) = self.repos.inventory.consume(&restaurant_id, &items).await {
            tracing::warn!(order_id = %order_id, restaurant_id = %restaurant_id, error = %e, "Inventory consume failed");
        }
        self.dashboard.invalidate(&restaurant_id);

        Ok(order_id)
    }

    /// Read-only pricing of a cart with the exact rules of [`Self::create_order`]
    pub async fn preview_order_pricing(
        &self,
        req: &PreviewOrderRequest,
    ) -> OrderResult<PricingPreview> {
        validate_required_text(&req.table_id, "table_id")?;
        validate_cart_lines(&req.items)?;

        let quote = self
            .quote(req.table_id.trim(), &req.items, now_millis())
            .await?;
        Ok(PricingPreview {
            subtotal: quote.breakdown.subtotal,
            discount: quote.breakdown.discount_amount,
            total: quote.breakdown.total,
            applied_discount_id: quote.resolution.applied_discount_id,
        })
    }

    /// Forward or lateral status move
    ///
    /// A target of `cancelled` runs [`Self::cancel_order`] so inventory is
    /// restored on every cancellation path.
    pub async fn update_order_status(
        &self,
        restaurant_id: &str,
        order_id: &str,
        status: OrderStatus,
    ) -> OrderResult<Order> {
        if status == OrderStatus::Cancelled {
            return self.cancel_order(restaurant_id, order_id).await;
        }
        validate_required_text(restaurant_id, "restaurant_id")?;
        validate_required_text(order_id, "order_id")?;

        Ok(self.transition(restaurant_id, order_id, status).await?.order)
    }

    pub async fn cancel_order(&self, restaurant_id: &str, order_id: &str) -> OrderResult<Order> {
        validate_required_text(restaurant_id, "restaurant_id")?;
        validate_required_text(order_id, "order_id")?;

        let Transition { order, changed } = self
            .transition(restaurant_id, order_id, OrderStatus::Cancelled)
            .await?;
        if changed {
            if let Err(e) = self
                .repos
                .inventory
                .restore(&order.restaurant_id, &order.items)
                .await
            {
                tracing::warn!(order_id = %order.id, restaurant_id = %order.restaurant_id, error = %e, "Inventory restore failed");
            }
        }
        Ok(order)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Newest first
    pub async fn list_orders(
        &self,
        restaurant_id: &str,
        status: Option<OrderStatus>,
        limit: Option<usize>,
    ) -> OrderResult<Vec<Order>> {
        let limit = limit
            .unwrap_or(self.settings.recent_orders_limit)
            .clamp(1, MAX_LIST_LIMIT);
        Ok(self
            .repos
            .orders
            .list_recent(restaurant_id, status, limit)
            .await?)
    }

    /// The window a live subscriber starts from
    pub async fn recent_window(&self, restaurant_id: &str) -> OrderResult<Vec<Order>> {
        self.list_orders(restaurant_id, None, None).await
    }

    pub async fn get_order(&self, restaurant_id: &str, order_id: &str) -> OrderResult<Order> {
        self.repos
            .orders
            .find_order(restaurant_id, order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    /// Customer tracking view, looked up by order id alone
    pub async fn track_order(&self, order_id: &str) -> OrderResult<OrderTracking> {
        let order = self
            .repos
            .orders
            .find_order_by_id(order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
        Ok(OrderTracking::from(&order))
    }

    /// Open orders oldest first, then the most recently completed ones
    pub async fn kitchen_orders(&self, restaurant_id: &str) -> OrderResult<Vec<Order>> {
        let mut orders = self
            .repos
            .orders
            .list_by_statuses(
                restaurant_id,
                &[OrderStatus::Pending, OrderStatus::Preparing],
            )
            .await?;
        if self.settings.kitchen_completed_tail > 0 {
            let completed = self
                .repos
                .orders
                .list_recent(
                    restaurant_id,
                    Some(OrderStatus::Completed),
                    self.settings.kitchen_completed_tail,
                )
                .await?;
            orders.extend(completed);
        }
        Ok(orders)
    }

    pub async fn dashboard_stats(&self, restaurant_id: &str) -> OrderResult<DashboardStats> {
        Ok(self
            .dashboard
            .get_or_compute(restaurant_id, self.repos.orders.as_ref())
            .await?)
    }

    pub async fn commission_summary(
        &self,
        since: Option<i64>,
    ) -> OrderResult<Vec<CommissionSummary>> {
        Ok(self.repos.orders.commission_summary(since).await?)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Steps 2-8 of the create flow, read-only
    async fn quote(&self, table_id: &str, items: &[CartLineInput], now: i64) -> OrderResult<Quote> {
        let table = self
            .repos
            .tables
            .find_table(table_id)
            .await?
            .ok_or_else(|| OrderError::TableNotFound(table_id.to_string()))?;
        if !table.is_active {
            return Err(OrderError::TableInactive(table_id.to_string()));
        }
        let restaurant_id = table.restaurant_id.clone();

        // Distinct ids in request order
        let mut seen = HashSet::new();
        let ids: Vec<String> = items
            .iter()
            .filter(|line| seen.insert(line.id.as_str()))
            .map(|line| line.id.clone())
            .collect();

        let catalog: HashMap<String, MenuItem> = self
            .repos
            .menu
            .find_items(&restaurant_id, &ids)
            .await?
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !catalog.contains_key(id.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(OrderError::ItemsNotFound(missing));
        }

        let unavailable: Vec<String> = ids
            .iter()
            .filter(|id| catalog.get(id.as_str()).is_some_and(|item| !item.available))
            .cloned()
            .collect();
        if !unavailable.is_empty() {
            return Err(OrderError::ItemsUnavailable(unavailable));
        }

        let mut lines = Vec::with_capacity(items.len());
        for input in items {
            let item = catalog
                .get(&input.id)
                .ok_or_else(|| OrderError::ItemsNotFound(vec![input.id.clone()]))?;
            let quantity = u32::try_from(input.quantity).map_err(|_| {
                OrderError::Validation(format!("invalid quantity {}", input.quantity))
            })?;
            lines.push(OrderLineItem {
                menu_item_id: item.id.clone(),
                name: item.name.clone(),
                price: item.price,
                quantity,
                category: item.category.clone(),
            });
        }

        let pricing_lines: Vec<PricingLine> = lines
            .iter()
            .map(|l| PricingLine {
                price: l.price,
                quantity: l.quantity,
            })
            .collect();
        let subtotal = pricing::subtotal(&pricing_lines);

        let discounts = match self.repos.discounts.active_discounts(&restaurant_id).await {
            Ok(discounts) => discounts,
            Err(e) => {
                tracing::warn!(restaurant_id = %restaurant_id, error = %e, "Failed to load discounts, pricing without discount");
                Vec::new()
            }
        };
        let discount_lines: Vec<DiscountLine> = lines
            .iter()
            .map(|l| DiscountLine {
                item_id: l.menu_item_id.clone(),
                category: l.category.clone(),
                line_subtotal: l.line_total(),
            })
            .collect();
        let mut resolution = resolve_best_discount(subtotal, &discount_lines, &discounts, now);

        let rate = self.commission_rate(&restaurant_id).await?;
        let breakdown = compute_pricing(&pricing_lines, resolution.discount_amount, rate);
        // A sub-cent discount rounds away entirely
        if breakdown.discount_amount.is_zero() {
            resolution.applied_discount_id = None;
        }

        Ok(Quote {
            table,
            lines,
            resolution,
            breakdown,
        })
    }

    async fn commission_rate(&self, restaurant_id: &str) -> OrderResult<Decimal> {
        let default_rate = self.settings.default_commission_rate;
        match self.repos.restaurants.find_restaurant(restaurant_id).await? {
            Some(restaurant) => Ok(restaurant.effective_commission_rate(default_rate)),
            None => {
                tracing::warn!(restaurant_id = %restaurant_id, "Restaurant row missing, using default commission rate");
                Ok(default_rate)
            }
        }
    }

    /// Compare-and-set status write, retried against the fresh row on a lost race
    async fn transition(
        &self,
        restaurant_id: &str,
        order_id: &str,
        target: OrderStatus,
    ) -> OrderResult<Transition> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = self.get_order(restaurant_id, order_id).await?;
            match current.status.check_transition(target) {
                TransitionCheck::NoOp => {
                    return Ok(Transition {
                        order: current,
                        changed: false,
                    });
                }
                TransitionCheck::Rejected => {
                    return Err(OrderError::InvalidTransition {
                        from: current.status,
                        to: target,
                    });
                }
                TransitionCheck::Allowed => {}
            }

            let updated_at = now_millis().max(current.updated_at + 1);
            let written = self
                .repos
                .orders
                .compare_and_set_status(restaurant_id, order_id, current.status, target, updated_at)
                .await?;

            match written {
                Some(order) => {
                    tracing::info!(
                        order_id = %order_id,
                        restaurant_id = %restaurant_id,
                        from = %current.status,
                        to = %target,
                        "Order status changed"
                    );
                    self.hub.publish(
                        restaurant_id,
                        LiveMessage::StatusChanged {
                            order_id: order.id.clone(),
                            status: order.status,
                            updated_at: order.updated_at,
                        },
                    );
                    self.dashboard.invalidate(restaurant_id);
                    return Ok(Transition {
                        order,
                        changed: true,
                    });
                }
                None => {
                    tracing::debug!(order_id = %order_id, attempt, "Status write lost a race, retrying");
                }
            }
        }

        Err(OrderError::Unknown(format!(
            "order {order_id} kept changing during status update"
        )))
    }
}
