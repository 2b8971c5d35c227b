//! Signal to order reconciliation.

use agent_core::types::{OrderRequest, Position, Side, Signal, SignalType};
use rust_decimal::Decimal;
use tracing::debug;

use crate::{AllocationSizer, Eligibility, TradingConfig};

/// Outcome of reconciling one ticker's signal.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeDecision {
    /// Order to submit
    Submit(OrderRequest),
    /// No position change warranted
    Hold { reason: String },
    /// The cycle is not allowed to trade
    Rejected { reason: String },
}

impl TradeDecision {
    pub fn order(&self) -> Option<&OrderRequest> {
        match self {
            TradeDecision::Submit(order) => Some(order),
            _ => None,
        }
    }

    fn hold(reason: impl Into<String>) -> Self {
        TradeDecision::Hold {
            reason: reason.into(),
        }
    }
}

/// Stateless per-ticker reconciler.
#[derive(Debug, Clone)]
pub struct TradeReconciler {
    sizer: AllocationSizer,
}

impl TradeReconciler {
    pub fn new(config: &TradingConfig) -> Self {
        Self {
            sizer: AllocationSizer::new(config.allocation_fraction),
        }
    }

    pub fn reconcile(
        &self,
        signal: &Signal,
        position: Option<&Position>,
        cash: Decimal,
        last_close: f64,
        eligibility: &Eligibility,
    ) -> TradeDecision {
        if let Some(reason) = eligibility.rejection() {
            return TradeDecision::Rejected { reason };
        }

        let (side, quantity) = match signal.signal_type {
            SignalType::Hold => return TradeDecision::hold("hold signal"),
            SignalType::Buy => {
                let qty = self.sizer.buy_quantity(cash, last_close);
                if qty <= Decimal::ZERO {
                    return TradeDecision::hold(format!(
                        "insufficient cash {cash} for a share at {last_close:.2}"
                    ));
                }
                (Side::Buy, qty)
            }
            SignalType::Sell => {
                let qty = self.sizer.sell_quantity(position);
                if qty <= Decimal::ZERO {
                    return TradeDecision::hold("no position to sell");
                }
                (Side::Sell, qty)
            }
        };

        debug!(symbol = %signal.symbol, %side, %quantity, "Reconciled signal into order");

        TradeDecision::Submit(OrderRequest::market(signal.symbol.clone(), side, quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::types::{OrderType, TimeInForce};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn signal(signal_type: SignalType) -> Signal {
        Signal::new("AAPL", signal_type, 0, 50.0)
    }

    fn reconciler() -> TradeReconciler {
        TradeReconciler::new(&TradingConfig::default())
    }

    #[test]
    fn test_buy_sizes_from_cash() {
        let decision = reconciler().reconcile(
            &signal(SignalType::Buy),
            None,
            dec!(10000),
            50.0,
            &Eligibility::Eligible,
        );

        let order = decision.order().unwrap();
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.quantity, dec!(60));
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.time_in_force, TimeInForce::GTC);
    }

    #[test]
    fn test_sell_without_position_holds() {
        let r = reconciler();
        let flat = Position::new("AAPL", Decimal::ZERO, Decimal::ZERO);

        for position in [None, Some(&flat)] {
            let decision = r.reconcile(
                &signal(SignalType::Sell),
                position,
                dec!(10000),
                50.0,
                &Eligibility::Eligible,
            );
            assert_eq!(
                decision,
                TradeDecision::Hold {
                    reason: "no position to sell".into()
                }
            );
        }
    }

    #[test]
    fn test_sell_full_position() {
        let position = Position::new("AAPL", dec!(15), dec!(40));
        let decision = reconciler().reconcile(
            &signal(SignalType::Sell),
            Some(&position),
            dec!(0),
            50.0,
            &Eligibility::Eligible,
        );

        let order = decision.order().unwrap();
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.quantity, dec!(15));
    }

    #[test]
    fn test_buy_with_too_little_cash_holds() {
        let decision = reconciler().reconcile(
            &signal(SignalType::Buy),
            None,
            dec!(100),
            50.0,
            &Eligibility::Eligible,
        );
        assert!(matches!(decision, TradeDecision::Hold { .. }));
    }

    #[test]
    fn test_ineligible_rejects_everything() {
        let verdict = Eligibility::Ineligible {
            equity: dec!(10000),
            day_trades: 3,
            limit: 3,
        };
        let position = Position::new("AAPL", dec!(15), dec!(40));

        for kind in [SignalType::Buy, SignalType::Sell] {
            let decision =
                reconciler().reconcile(&signal(kind), Some(&position), dec!(10000), 50.0, &verdict);
            assert!(matches!(decision, TradeDecision::Rejected { .. }));
        }
    }

    #[test]
    fn test_hold_passes_through() {
        let decision = reconciler().reconcile(
            &signal(SignalType::Hold),
            None,
            dec!(10000),
            50.0,
            &Eligibility::Eligible,
        );
        assert!(decision.order().is_none());
    }

    proptest! {
        #[test]
        fn prop_orders_are_positive_whole_shares(
            cash in -1_000_000i64..10_000_000,
            price in -10.0f64..5000.0,
            held in -100i64..10_000,
            buy in any::<bool>(),
        ) {
            let kind = if buy { SignalType::Buy } else { SignalType::Sell };
            let position = Position::new("AAPL", Decimal::from(held), dec!(10));
            let decision = reconciler().reconcile(
                &signal(kind),
                Some(&position),
                Decimal::from(cash),
                price,
                &Eligibility::Eligible,
            );

            if let Some(order) = decision.order() {
                prop_assert!(order.quantity > Decimal::ZERO);
                prop_assert_eq!(order.quantity, order.quantity.trunc());
            }
        }
    }
}
