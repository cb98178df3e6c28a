//! Customer cart with indicative totals
//!
//! Prices here are display copies. The server re-prices every submission, so
//! nothing computed in this module is ever sent: the VAT and tip figures exist
//! only for the checkout screen.

use rust_decimal::{Decimal, RoundingStrategy};
use shared::order::{CartLineInput, CreateOrderRequest, PreviewOrderRequest, PricingPreview};

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Tip choice on the checkout screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tip {
    #[default]
    None,
    /// Percent of the order total, e.g. `10` for 10 %
    Percent(Decimal),
    Amount(Decimal),
}

impl Tip {
    fn amount_on(&self, base: Decimal) -> Decimal {
        let tip = match self {
            Tip::None => Decimal::ZERO,
            Tip::Percent(pct) => base * *pct / Decimal::ONE_HUNDRED,
            Tip::Amount(amount) => *amount,
        };
        round_money(tip.max(Decimal::ZERO))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub menu_item_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Indicative checkout figures
#[derive(Debug, Clone, PartialEq)]
pub struct CartPreview {
    pub subtotal: Decimal,
    pub discount: Decimal,
    /// Total before tip; the server's figure when a preview is available
    pub order_total: Decimal,
    /// VAT contained in `order_total` (prices are VAT-inclusive)
    pub vat: Decimal,
    pub tip: Decimal,
    pub total: Decimal,
    pub applied_discount_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line; the same item merges into one line with the latest price
    pub fn add(&mut self, line: CartLine) {
        if line.quantity == 0 {
            return;
        }
        match self
            .lines
            .iter_mut()
            .find(|l| l.menu_item_id == line.menu_item_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                existing.unit_price = line.unit_price;
                existing.name = line.name;
            }
            None => self.lines.push(line),
        }
    }

    /// Set a line's quantity; `0` removes it
    pub fn set_quantity(&mut self, menu_item_id: &str, quantity: u32) {
        if quantity == 0 {
            self.remove(menu_item_id);
        } else if let Some(line) = self.lines.iter_mut().find(|l| l.menu_item_id == menu_item_id) {
            line.quantity = quantity;
        }
    }

    pub fn remove(&mut self, menu_item_id: &str) {
        self.lines.retain(|l| l.menu_item_id != menu_item_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn subtotal(&self) -> Decimal {
        round_money(self.lines.iter().map(CartLine::line_total).sum())
    }

    fn request_lines(&self) -> Vec<CartLineInput> {
        self.lines
            .iter()
            .map(|l| CartLineInput::new(l.menu_item_id.clone(), i64::from(l.quantity)))
            .collect()
    }

    pub fn preview_request(&self, table_id: &str) -> PreviewOrderRequest {
        PreviewOrderRequest {
            table_id: table_id.to_string(),
            items: self.request_lines(),
        }
    }

    pub fn create_request(
        &self,
        table_id: &str,
        customer_name: Option<String>,
        notes: Option<String>,
    ) -> CreateOrderRequest {
        CreateOrderRequest {
            table_id: table_id.to_string(),
            items: self.request_lines(),
            customer_name,
            notes,
        }
    }

    /// Checkout figures; `server` is the last `/api/orders/preview` answer
    pub fn preview(
        &self,
        vat_rate: Decimal,
        tip: Tip,
        server: Option<&PricingPreview>,
    ) -> CartPreview {
        let (subtotal, discount, order_total, applied_discount_id) = match server {
            Some(p) => (p.subtotal, p.discount, p.total, p.applied_discount_id.clone()),
            None => {
                let subtotal = self.subtotal();
                (subtotal, Decimal::ZERO, subtotal, None)
            }
        };

        let rate = vat_rate.max(Decimal::ZERO);
        let vat = round_money(order_total - order_total / (Decimal::ONE + rate));
        let tip = tip.amount_on(order_total);

        CartPreview {
            subtotal,
            discount,
            order_total,
            vat,
            tip,
            total: order_total + tip,
            applied_discount_id,
        }
    }
}
