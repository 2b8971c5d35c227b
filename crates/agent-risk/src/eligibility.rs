//! Pattern-day-trader eligibility.

use std::collections::HashSet;

use agent_core::error::AgentError;
use agent_core::types::Account;
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TradingConfig;

/// Verdict for a whole cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    Ineligible {
        equity: Decimal,
        day_trades: u32,
        limit: u32,
    },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }

    /// Why orders are rejected, if they are.
    pub fn rejection(&self) -> Option<String> {
        match self {
            Eligibility::Eligible => None,
            Eligibility::Ineligible {
                equity,
                day_trades,
                limit,
            } => Some(format!(
                "equity {equity} under day-trade threshold with {day_trades}/{limit} day trades"
            )),
        }
    }

    /// `IneligibleTradingWindow` for a rejected cycle.
    pub fn into_result(self) -> Result<(), AgentError> {
        match self {
            Eligibility::Eligible => Ok(()),
            Eligibility::Ineligible {
                equity,
                day_trades,
                limit,
            } => Err(AgentError::IneligibleTradingWindow {
                equity,
                day_trades,
                limit,
            }),
        }
    }
}

/// Accounts under the equity threshold may not place a trade that would
/// exceed the day-trade limit.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTradeRule {
    pub equity_threshold: Decimal,
    pub max_day_trades: u32,
    pub window_days: u32,
}

impl Default for DayTradeRule {
    fn default() -> Self {
        Self::from_config(&TradingConfig::default())
    }
}

impl DayTradeRule {
    pub fn from_config(config: &TradingConfig) -> Self {
        Self {
            equity_threshold: config.pdt_equity_threshold,
            max_day_trades: config.max_day_trades,
            window_days: config.day_trade_window_days,
        }
    }

    /// Evaluate using the broker-reported day trade count.
    pub fn check(&self, account: &Account) -> Eligibility {
        self.check_count(account.equity, account.day_trade_count)
    }

    /// Evaluate by counting trade timestamps in the trailing window, for
    /// brokers that do not report a count.
    pub fn check_history(
        &self,
        equity: Decimal,
        trades: &[DateTime<Utc>],
        now: DateTime<Utc>,
    ) -> Eligibility {
        self.check_count(equity, count_in_window(trades, now, self.window_days))
    }

    pub fn check_count(&self, equity: Decimal, day_trades: u32) -> Eligibility {
        if equity < self.equity_threshold && day_trades.saturating_add(1) > self.max_day_trades {
            Eligibility::Ineligible {
                equity,
                day_trades,
                limit: self.max_day_trades,
            }
        } else {
            Eligibility::Eligible
        }
    }
}

/// Trades on or before `now` that fall within the trailing `window_days`
/// trading days (weekends skipped), today included.
pub fn count_in_window(trades: &[DateTime<Utc>], now: DateTime<Utc>, window_days: u32) -> u32 {
    let days = trading_days_back(now.date_naive(), window_days);
    trades
        .iter()
        .filter(|t| **t <= now && days.contains(&t.date_naive()))
        .count() as u32
}

fn trading_days_back(from: NaiveDate, count: u32) -> HashSet<NaiveDate> {
    let mut days = HashSet::with_capacity(count as usize);
    let mut day = from;
    while days.len() < count as usize {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            days.insert(day);
        }
        match day.checked_sub_days(Days::new(1)) {
            Some(previous) => day = previous,
            None => break,
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_rejects_at_limit_under_threshold() {
        let rule = DayTradeRule::default();
        let account = Account::new(dec!(10000)).with_day_trades(3);

        let verdict = rule.check(&account);
        assert_eq!(
            verdict,
            Eligibility::Ineligible {
                equity: dec!(10000),
                day_trades: 3,
                limit: 3
            }
        );
        assert!(matches!(
            verdict.into_result(),
            Err(AgentError::IneligibleTradingWindow { day_trades: 3, .. })
        ));
    }

    #[test]
    fn test_allows_below_limit_or_above_threshold() {
        let rule = DayTradeRule::default();
        assert!(rule.check(&Account::new(dec!(10000)).with_day_trades(2)).is_eligible());
        assert!(rule.check(&Account::new(dec!(25000)).with_day_trades(5)).is_eligible());
        assert!(rule.check(&Account::new(dec!(30000)).with_day_trades(3)).is_eligible());
    }

    #[test]
    fn test_window_skips_weekends() {
        // Monday 2024-01-15; five trading days reach back to Tuesday the 9th
        let now = at(2024, 1, 15);
        let trades = vec![
            at(2024, 1, 15),
            at(2024, 1, 12),
            at(2024, 1, 13), // Saturday
            at(2024, 1, 9),
            at(2024, 1, 8), // outside window
        ];
        assert_eq!(count_in_window(&trades, now, 5), 3);
    }

    #[test]
    fn test_window_ignores_future_trades() {
        let now = at(2024, 1, 10);
        let trades = vec![at(2024, 1, 10), at(2024, 1, 11)];
        assert_eq!(count_in_window(&trades, now, 5), 1);
    }

    #[test]
    fn test_history_check() {
        let rule = DayTradeRule::default();
        let now = at(2024, 1, 17);
        let trades = vec![at(2024, 1, 16), at(2024, 1, 15), at(2024, 1, 12)];

        assert!(!rule.check_history(dec!(5000), &trades, now).is_eligible());
        assert!(rule.check_history(dec!(5000), &trades[..2], now).is_eligible());
    }
}
