//! Order quantity sizing.

use agent_core::types::Position;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Commits a fixed share of cash per BUY, in whole shares.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSizer {
    fraction: Decimal,
}

impl AllocationSizer {
    pub fn new(fraction: Decimal) -> Self {
        Self { fraction }
    }

    pub fn fraction(&self) -> Decimal {
        self.fraction
    }

    /// `floor(cash * fraction / last_close)`, zero for an unusable price.
    pub fn buy_quantity(&self, cash: Decimal, last_close: f64) -> Decimal {
        if !last_close.is_finite() || last_close <= 0.0 {
            return Decimal::ZERO;
        }
        let Some(price) = Decimal::from_f64(last_close) else {
            return Decimal::ZERO;
        };
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let budget = cash * self.fraction;
        match budget.checked_div(price) {
            Some(qty) => qty.floor().max(Decimal::ZERO),
            None => Decimal::ZERO,
        }
    }

    /// Whole shares held, zero when flat or short.
    pub fn sell_quantity(&self, position: Option<&Position>) -> Decimal {
        position
            .map(|p| p.quantity.trunc().max(Decimal::ZERO))
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_buy_quantity() {
        let sizer = AllocationSizer::new(dec!(0.3));
        assert_eq!(sizer.buy_quantity(dec!(10000), 50.0), dec!(60));
        // 3000 / 70 = 42.86
        assert_eq!(sizer.buy_quantity(dec!(10000), 70.0), dec!(42));
    }

    #[test]
    fn test_buy_quantity_bad_price() {
        let sizer = AllocationSizer::new(dec!(0.3));
        for price in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert_eq!(sizer.buy_quantity(dec!(10000), price), Decimal::ZERO);
        }
        assert_eq!(sizer.buy_quantity(dec!(-100), 10.0), Decimal::ZERO);
    }

    #[test]
    fn test_sell_quantity_truncates() {
        let sizer = AllocationSizer::new(dec!(0.3));
        let position = Position::new("AAPL", dec!(12.75), dec!(100));
        assert_eq!(sizer.sell_quantity(Some(&position)), dec!(12));
        assert_eq!(sizer.sell_quantity(None), Decimal::ZERO);
    }
}
