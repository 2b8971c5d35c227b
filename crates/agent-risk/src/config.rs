//! Trading settings.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Order gating and sizing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// Train, signal and reconcile; when false only the report runs
    pub enabled: bool,
    /// Reconcile but never submit
    pub dry_run: bool,
    /// Share of available cash committed to a single BUY
    pub allocation_fraction: Decimal,
    /// Equity below which the day-trade limit applies
    pub pdt_equity_threshold: Decimal,
    /// Day trades allowed in the trailing window
    pub max_day_trades: u32,
    /// Trailing window length in trading days
    pub day_trade_window_days: u32,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dry_run: false,
            allocation_fraction: dec!(0.3),
            pdt_equity_threshold: dec!(25000),
            max_day_trades: 3,
            day_trade_window_days: 5,
        }
    }
}

impl TradingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.allocation_fraction <= Decimal::ZERO || self.allocation_fraction > Decimal::ONE {
            return Err(format!(
                "allocation_fraction must be in (0, 1], got {}",
                self.allocation_fraction
            ));
        }
        if self.pdt_equity_threshold < Decimal::ZERO {
            return Err("pdt_equity_threshold must not be negative".into());
        }
        if self.day_trade_window_days == 0 {
            return Err("day_trade_window_days must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TradingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.allocation_fraction, dec!(0.3));
    }

    #[test]
    fn test_allocation_bounds() {
        for fraction in [dec!(0), dec!(-0.1), dec!(1.5)] {
            let config = TradingConfig {
                allocation_fraction: fraction,
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }
        let full = TradingConfig {
            allocation_fraction: dec!(1),
            ..Default::default()
        };
        assert!(full.validate().is_ok());
    }
}
