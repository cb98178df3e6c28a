//! Price Calculator
//!
//! Monetary outputs are rounded to 2 decimal places (half away from zero)
//! on final values only. Line totals and the subtotal sum stay unrounded.

use rust_decimal::prelude::*;
use serde::Serialize;

/// Decimal places for monetary outputs
const DECIMAL_PLACES: u32 = 2;

/// Round a monetary value to 2 decimal places, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// One priced line (catalog price × quantity)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingLine {
    pub price: Decimal,
    pub quantity: u32,
}

impl PricingLine {
    #[inline]
    pub fn total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Authoritative breakdown of an order's money
///
/// `vat` and `tip` are always zero here; indicative VAT/tip only exist in the
/// customer cart preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingBreakdown {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub discounted_subtotal: Decimal,
    pub vat: Decimal,
    pub tip: Decimal,
    pub total: Decimal,
    pub commission_rate: Decimal,
    pub commission_amount: Decimal,
}

/// Unrounded `Σ price × quantity`
pub fn subtotal(lines: &[PricingLine]) -> Decimal {
    lines.iter().map(PricingLine::total).sum()
}

/// Compute final pricing for an order.
///
/// The discount is clamped to `[0, subtotal]` and applied before commission;
/// commission is charged on the discounted total. The reported discount is
/// `subtotal − total` after rounding, so `total = max(0, subtotal − discount)`
/// holds exactly on the rounded values.
pub fn compute_pricing(
    lines: &[PricingLine],
    discount_amount: Decimal,
    commission_rate: Decimal,
) -> PricingBreakdown {
    let raw_subtotal = subtotal(lines).max(Decimal::ZERO);
    let discount = discount_amount.max(Decimal::ZERO).min(raw_subtotal);
    let rate = commission_rate.max(Decimal::ZERO);

    let subtotal = round_money(raw_subtotal);
    let total = round_money(raw_subtotal - discount);
    let discount_amount = subtotal - total;
    let commission_amount = round_money(total * rate);

    PricingBreakdown {
        subtotal,
        discount_amount,
        discounted_subtotal: total,
        vat: Decimal::ZERO,
        tip: Decimal::ZERO,
        total,
        commission_rate: rate,
        commission_amount,
    }
}
