//! Discount Matcher
//!
//! Scope matching and per-discount amount computation.

use rust_decimal::Decimal;
use shared::models::{Discount, DiscountKind, DiscountScope};

/// A priced order line as the resolver sees it
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountLine {
    pub item_id: String,
    pub category: Option<String>,
    /// Unrounded `price × quantity`
    pub line_subtotal: Decimal,
}

/// Check if a scope covers a line
pub fn matches_line(scope: &DiscountScope, line: &DiscountLine) -> bool {
    match scope {
        DiscountScope::All => true,
        DiscountScope::Category { category_id } => {
            line.category.as_deref() == Some(category_id.as_str())
        }
        DiscountScope::Item { item_id } => &line.item_id == item_id,
    }
}

/// Subtotal the discount is computed against
///
/// Returns `None` when a scoped discount matches no line (not applicable).
pub fn qualifying_subtotal(
    scope: &DiscountScope,
    subtotal: Decimal,
    lines: &[DiscountLine],
) -> Option<Decimal> {
    if matches!(scope, DiscountScope::All) {
        return Some(subtotal);
    }
    let mut matched = false;
    let mut sum = Decimal::ZERO;
    for line in lines.iter().filter(|l| matches_line(scope, l)) {
        matched = true;
        sum += line.line_subtotal;
    }
    matched.then_some(sum)
}

/// Discount amount for a qualifying subtotal, clamped to `[0, qualifying]`
pub fn discount_amount(discount: &Discount, qualifying: Decimal) -> Decimal {
    let qualifying = qualifying.max(Decimal::ZERO);
    let raw = match discount.kind {
        DiscountKind::Percentage => qualifying * discount.value / Decimal::ONE_HUNDRED,
        DiscountKind::Fixed => discount.value,
    };
    raw.max(Decimal::ZERO).min(qualifying)
}
