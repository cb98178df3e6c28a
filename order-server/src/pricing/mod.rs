//! Pricing Module
//!
//! Pure functions for authoritative order pricing:
//! - [`compute_pricing`]: subtotal, discount, commission and total
//! - [`resolve_best_discount`]: picks the single discount an order gets

mod calculator;
pub mod matcher;
mod resolver;

pub use calculator::*;
pub use resolver::*;
