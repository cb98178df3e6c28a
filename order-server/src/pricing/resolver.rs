//! Discount Resolver
//!
//! At most one discount applies per order. Candidates are ranked by:
//! 1. scope specificity (item > category > all)
//! 2. larger discount amount
//! 3. lexicographically smallest discount id

use std::cmp::Ordering;

use rust_decimal::Decimal;
use shared::models::Discount;

use super::matcher::{DiscountLine, discount_amount, qualifying_subtotal};

/// Result of discount resolution
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscountResolution {
    /// Unrounded amount; final rounding happens in [`super::compute_pricing`]
    pub discount_amount: Decimal,
    pub applied_discount_id: Option<String>,
}

struct Candidate<'a> {
    discount: &'a Discount,
    amount: Decimal,
}

/// `Greater` means `a` beats `b`
fn rank(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    a.discount
        .scope
        .specificity()
        .cmp(&b.discount.scope.specificity())
        .then_with(|| a.amount.cmp(&b.amount))
        .then_with(|| b.discount.id.cmp(&a.discount.id))
}

/// Select the single best applicable discount for an order at `now` (Unix millis).
///
/// A discount that matches but yields a zero amount is not applied. Amounts
/// are unrounded here; one below half a cent still wins and is only cleared
/// once `OrderService::quote` rounds it to zero.
pub fn resolve_best_discount(
    subtotal: Decimal,
    lines: &[DiscountLine],
    discounts: &[Discount],
    now: i64,
) -> DiscountResolution {
    let best = discounts
        .iter()
        .filter(|d| d.is_eligible_at(now))
        .filter_map(|discount| {
            let qualifying = qualifying_subtotal(&discount.scope, subtotal, lines)?;
            let amount = discount_amount(discount, qualifying);
            (amount > Decimal::ZERO).then_some(Candidate { discount, amount })
        })
        .max_by(rank);

    match best {
        Some(c) => DiscountResolution {
            discount_amount: c.amount,
            applied_discount_id: Some(c.discount.id.clone()),
        },
        None => DiscountResolution::default(),
    }
}
