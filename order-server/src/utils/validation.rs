//! Input validation helpers
//!
//! Text limits count characters, not bytes.

use shared::order::CartLineInput;

use crate::orders::OrderError;

/// Maximum lines per order
pub const MAX_ORDER_LINES: usize = 100;

/// Per-line quantity bounds
pub const MIN_QUANTITY: i64 = 1;
pub const MAX_QUANTITY: i64 = 99;

/// Customer name shown to staff
pub const MAX_CUSTOMER_NAME_LEN: usize = 100;

/// Free-form order notes
pub const MAX_NOTES_LEN: usize = 500;

/// Validate that a required string is non-empty.
pub fn validate_required_text(value: &str, field: &str) -> Result<(), OrderError> {
    if value.trim().is_empty() {
        return Err(OrderError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: Option<&str>,
    field: &str,
    max_len: usize,
) -> Result<(), OrderError> {
    if let Some(v) = value {
        let len = v.trim().chars().count();
        if len > max_len {
            return Err(OrderError::Validation(format!(
                "{field} is too long ({len} chars, max {max_len})"
            )));
        }
    }
    Ok(())
}

/// Validate the cart lines of a create/preview request.
pub fn validate_cart_lines(items: &[CartLineInput]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::Validation("items must not be empty".into()));
    }
    if items.len() > MAX_ORDER_LINES {
        return Err(OrderError::Validation(format!(
            "too many items ({}, max {MAX_ORDER_LINES})",
            items.len()
        )));
    }
    for (i, item) in items.iter().enumerate() {
        validate_required_text(&item.id, &format!("items[{i}].id"))?;
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&item.quantity) {
            return Err(OrderError::Validation(format!(
                "items[{i}].quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}, got {}",
                item.quantity
            )));
        }
    }
    Ok(())
}

/// Trim an optional text field, mapping blank to `None`.
pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
