//! Daily profit/loss report generation.

use std::fmt;
use std::str::FromStr;

use agent_core::types::SymbolBar;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::TickerOutcome;

/// Report body when no bars were fetched at all.
pub const NO_DATA_REPORT: &str = "No data available to generate report.";

/// How profit/loss is computed over the combined sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Last close minus first close of the whole combined sequence
    Combined,
    /// Last minus first close per ticker, summed
    #[default]
    PerTicker,
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportMode::Combined => write!(f, "combined"),
            ReportMode::PerTicker => write!(f, "per_ticker"),
        }
    }
}

impl FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "combined" => Ok(ReportMode::Combined),
            "per_ticker" | "per-ticker" | "ticker" => Ok(ReportMode::PerTicker),
            _ => Err(format!("Invalid report mode: {}", s)),
        }
    }
}

/// Pure aggregation of bars into the daily report text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    mode: ReportMode,
}

impl Reporter {
    pub fn new(mode: ReportMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    /// Render the report for bars of one or more tickers, in fetch order.
    pub fn generate(&self, bars: &[SymbolBar]) -> String {
        let (first, last) = match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                error!("{}", NO_DATA_REPORT);
                return NO_DATA_REPORT.to_string();
            }
        };

        let deltas = per_ticker_deltas(bars);
        let tickers: Vec<&str> = deltas.iter().map(|(t, _)| *t).collect();

        let mut text = String::from("Daily Trading Report:\n");
        text.push_str(&format!("Tickers: {}\n", tickers.join(", ")));

        match self.mode {
            ReportMode::Combined => {
                let pl = last.bar.close - first.bar.close;
                text.push_str(&format!("Profit/Loss: {:.2}\n", positive_zero(pl)));
            }
            ReportMode::PerTicker => {
                for (ticker, delta) in &deltas {
                    text.push_str(&format!("  {}: {:+.2}\n", ticker, positive_zero(*delta)));
                }
                let total: f64 = deltas.iter().map(|(_, d)| d).sum();
                text.push_str(&format!("Profit/Loss: {:.2}\n", positive_zero(total)));
            }
        }
        text
    }

    /// One line per ticker outcome, appended to the report after trading.
    pub fn cycle_summary(outcomes: &[TickerOutcome]) -> String {
        let mut text = String::from("Cycle Summary:\n");
        for outcome in outcomes {
            text.push_str(&format!("  {}\n", outcome));
        }
        text
    }
}

/// Tickers in order of first appearance with last minus first close.
fn per_ticker_deltas(bars: &[SymbolBar]) -> Vec<(&str, f64)> {
    let mut spans: Vec<(&str, f64, f64)> = Vec::new();
    for sb in bars {
        match spans.iter_mut().find(|(t, _, _)| *t == sb.symbol) {
            Some(span) => span.2 = sb.bar.close,
            None => spans.push((sb.symbol.as_str(), sb.bar.close, sb.bar.close)),
        }
    }
    spans
        .into_iter()
        .map(|(ticker, first, last)| (ticker, last - first))
        .collect()
}

// keeps "-0.00" out of the report
fn positive_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value
    }
}
