//! Restaurant Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Restaurant (tenant) entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    /// Platform commission rate (0.05 = 5%). Falls back to the platform default when unset.
    pub commission_rate: Option<Decimal>,
}

impl Restaurant {
    /// Commission rate to charge, falling back to `default_rate`
    pub fn effective_commission_rate(&self, default_rate: Decimal) -> Decimal {
        self.commission_rate.unwrap_or(default_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_effective_commission_rate() {
        let mut r = Restaurant {
            id: "r1".into(),
            name: "Trattoria".into(),
            commission_rate: None,
        };
        assert_eq!(r.effective_commission_rate(dec!(0.05)), dec!(0.05));

        r.commission_rate = Some(dec!(0.03));
        assert_eq!(r.effective_commission_rate(dec!(0.05)), dec!(0.03));
    }
}
