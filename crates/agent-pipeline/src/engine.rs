//! Trading cycle engine.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use agent_core::error::{AgentError, ExternalServiceError};
use agent_core::traits::{Broker, Classifier, DataSource, Notifier};
use agent_core::types::{Bar, Signal, SymbolBar, Timeframe};
use agent_features::{FeatureBuilder, FeatureConfig, TrainingSet};
use agent_model::{ForestConfig, RandomForestClassifier, SignalGenerator};
use agent_risk::{DayTradeRule, Eligibility, TradeDecision, TradeReconciler, TradingConfig};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{ReportMode, Reporter, Stage, TickerOutcome, TrainingRecord};

/// Cycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Bar timeframe requested from the data source
    pub timeframe: Timeframe,
    /// Calendar days of history fetched per ticker
    pub lookback_days: u32,
    /// Last day of the window; the cycle start when unset
    pub end_date: Option<NaiveDate>,
    pub features: FeatureConfig,
    pub model: ForestConfig,
    pub trading: TradingConfig,
    pub report_mode: ReportMode,
    /// Subject passed to the notifier
    pub report_subject: String,
    /// Upper bound on every call to the data source, broker and notifier
    pub external_timeout_secs: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::Daily,
            lookback_days: 365,
            end_date: None,
            features: FeatureConfig::default(),
            model: ForestConfig::default(),
            trading: TradingConfig::default(),
            report_mode: ReportMode::default(),
            report_subject: "Daily Trading Report".to_string(),
            external_timeout_secs: 30,
        }
    }
}

impl CycleConfig {
    /// Fetch range: `lookback_days` up to the end of `end_date`, or up to `now`.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = match self.end_date {
            Some(date) => date.and_time(NaiveTime::MIN).and_utc() + Duration::days(1),
            None => now,
        };
        (end - Duration::days(i64::from(self.lookback_days)), end)
    }
}

/// Which steps a cycle runs after fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleMode {
    /// Train, signal, reconcile and submit
    Trade,
    /// Train and signal; the broker is never called
    SignalsOnly,
    /// Fetch and report
    ReportOnly,
}

/// Result of one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub mode: CycleMode,
    pub started_at: DateTime<Utc>,
    pub report_text: String,
    pub outcomes: Vec<TickerOutcome>,
    pub training: Vec<TrainingRecord>,
    /// Verdict of the day-trade rule, when the account was read
    pub eligibility: Option<Eligibility>,
    /// Whether the notifier accepted the report
    pub notified: bool,
}

impl CycleReport {
    pub fn signals(&self) -> Vec<&Signal> {
        self.outcomes.iter().filter_map(|o| o.signal()).collect()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}

/// Day-trade verdict, decided by the first account read of a cycle.
enum AccountState {
    Unread,
    Ready(Eligibility),
    Unavailable(String),
}

/// One pass over the configured tickers.
///
/// Tickers are processed one at a time; a failure for one ticker is recorded
/// in its outcome and never stops the others.
pub struct TradingCycle {
    config: CycleConfig,
    data_source: Arc<dyn DataSource>,
    broker: Arc<dyn Broker>,
    notifier: Option<Arc<dyn Notifier>>,
    builder: FeatureBuilder,
    reconciler: TradeReconciler,
    rule: DayTradeRule,
    reporter: Reporter,
}

impl TradingCycle {
    pub fn new(
        config: CycleConfig,
        data_source: Arc<dyn DataSource>,
        broker: Arc<dyn Broker>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Result<Self, AgentError> {
        let builder = FeatureBuilder::new(config.features.clone())?;
        config.model.validate()?;
        config.trading.validate().map_err(AgentError::Config)?;

        Ok(Self {
            builder,
            reconciler: TradeReconciler::new(&config.trading),
            rule: DayTradeRule::from_config(&config.trading),
            reporter: Reporter::new(config.report_mode),
            config,
            data_source,
            broker,
            notifier,
        })
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    /// Full cycle; only the report runs when trading is disabled.
    pub async fn run(&self, tickers: &[String]) -> CycleReport {
        let mode = if self.config.trading.enabled {
            CycleMode::Trade
        } else {
            CycleMode::ReportOnly
        };
        self.run_mode(tickers, mode).await
    }

    /// Latest signal per ticker without touching the broker.
    pub async fn signals(&self, tickers: &[String]) -> CycleReport {
        self.run_mode(tickers, CycleMode::SignalsOnly).await
    }

    /// Fetch and report only.
    pub async fn report(&self, tickers: &[String]) -> CycleReport {
        self.run_mode(tickers, CycleMode::ReportOnly).await
    }

    pub async fn run_mode(&self, tickers: &[String], mode: CycleMode) -> CycleReport {
        let started_at = Utc::now();
        let (start, end) = self.config.window(started_at);
        info!(?mode, tickers = tickers.len(), "Starting trading cycle");

        let mut combined: Vec<SymbolBar> = Vec::new();
        let mut outcomes = Vec::with_capacity(tickers.len());
        let mut training = Vec::new();
        let mut account = AccountState::Unread;

        for symbol in tickers {
            let bars = match self.fetch(symbol, start, end).await {
                Ok(bars) => bars,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "No data fetched for {}. Skipping.", symbol);
                    outcomes.push(TickerOutcome::failed(symbol, Stage::Fetch, e));
                    continue;
                }
            };
            combined.extend(bars.iter().map(|bar| SymbolBar::new(symbol.clone(), *bar)));

            if mode == CycleMode::ReportOnly {
                outcomes.push(TickerOutcome::Fetched {
                    symbol: symbol.clone(),
                    bars: bars.len(),
                });
                continue;
            }

            let signal = match self.train_and_signal(symbol, &bars) {
                Ok((signal, record)) => {
                    training.push(record);
                    signal
                }
                Err((stage, e)) => {
                    warn!(symbol = %symbol, %stage, error = %e, "Skipping ticker");
                    outcomes.push(TickerOutcome::failed(symbol, stage, e));
                    continue;
                }
            };
            info!(
                symbol = %symbol,
                signal = %signal.signal_type,
                confidence = signal.confidence,
                "Generated signal"
            );

            if mode == CycleMode::SignalsOnly {
                outcomes.push(TickerOutcome::Signalled {
                    symbol: symbol.clone(),
                    signal,
                });
                continue;
            }

            let outcome = self.trade(symbol, signal, &bars, &mut account).await;
            outcomes.push(outcome);
        }

        let mut report_text = self.reporter.generate(&combined);
        if mode != CycleMode::ReportOnly && !outcomes.is_empty() {
            report_text.push('\n');
            report_text.push_str(&Reporter::cycle_summary(&outcomes));
        }

        let notified = self.notify(&report_text).await;
        let eligibility = match account {
            AccountState::Ready(eligibility) => Some(eligibility),
            _ => None,
        };

        let report = CycleReport {
            mode,
            started_at,
            report_text,
            outcomes,
            training,
            eligibility,
            notified,
        };
        info!(
            tickers = tickers.len(),
            failures = report.failures(),
            "Trading cycle complete"
        );
        report
    }

    async fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, AgentError> {
        let bars = self
            .bounded(
                "fetch bars",
                self.data_source
                    .get_historical_bars(symbol, self.config.timeframe, start, end),
            )
            .await?;
        if bars.is_empty() {
            return Err(AgentError::InsufficientData {
                required: 1,
                available: 0,
            });
        }
        debug!(symbol, bars = bars.len(), source = self.data_source.name(), "Fetched bars");
        Ok(bars)
    }

    /// Fresh classifier per ticker, signal for the latest row.
    fn train_and_signal(
        &self,
        symbol: &str,
        bars: &[Bar],
    ) -> Result<(Signal, TrainingRecord), (Stage, AgentError)> {
        let (set, rows) = TrainingSet::from_bars(&self.builder, bars);
        if rows.is_empty() {
            return Err((
                Stage::Features,
                AgentError::InsufficientData {
                    required: self.builder.config().first_index() + 1,
                    available: bars.len(),
                },
            ));
        }

        let mut model = RandomForestClassifier::new(self.config.model.clone())
            .map_err(|e| (Stage::Model, AgentError::from(e)))?;
        let summary = model
            .train(&set.features, &set.labels)
            .map_err(|e| (Stage::Model, AgentError::from(e)))?;
        debug!(
            symbol,
            train_rows = summary.train_rows,
            validation_accuracy = ?summary.validation_accuracy,
            "Trained classifier"
        );

        let signal = SignalGenerator::new()
            .latest(&model, symbol, &rows)
            .map_err(|e| (Stage::Model, AgentError::from(e)))?;

        Ok((
            signal,
            TrainingRecord {
                symbol: symbol.to_string(),
                summary,
                up_ratio: set.up_ratio(),
            },
        ))
    }

    async fn trade(
        &self,
        symbol: &str,
        signal: Signal,
        bars: &[Bar],
        account: &mut AccountState,
    ) -> TickerOutcome {
        let last_close = bars.last().map(|b| b.close).unwrap_or(0.0);
        if let Ok(price) = Decimal::try_from(last_close) {
            self.broker.mark_price(symbol, price).await;
        }

        // Cash of the first read; later tickers read the account again.
        let mut first_cash = None;
        if let AccountState::Unread = account {
            *account = match self.read_account().await {
                Ok((cash, eligibility)) => {
                    first_cash = Some(cash);
                    AccountState::Ready(eligibility)
                }
                Err(reason) => AccountState::Unavailable(reason),
            };
        }
        let eligibility = match &*account {
            AccountState::Ready(eligibility) => eligibility,
            AccountState::Unavailable(reason) => {
                return TickerOutcome::failed(
                    symbol,
                    Stage::Broker,
                    format!("account unavailable: {}", reason),
                );
            }
            AccountState::Unread => {
                return TickerOutcome::failed(symbol, Stage::Broker, "account not read");
            }
        };

        if let Some(reason) = eligibility.rejection() {
            warn!(symbol, %reason, "Order rejected by day-trade rule");
            return TickerOutcome::Ineligible {
                symbol: symbol.to_string(),
                signal,
                reason,
            };
        }

        let cash = match first_cash {
            Some(cash) => cash,
            None => match self.bounded("read account", self.broker.get_account()).await {
                Ok(current) => current.cash,
                Err(e) => {
                    error!(symbol, error = %e, "Failed to read account cash");
                    return TickerOutcome::failed(symbol, Stage::Broker, e);
                }
            },
        };

        let position = match self
            .bounded("read position", self.broker.get_position(symbol))
            .await
        {
            Ok(position) => position,
            Err(e) => {
                error!(symbol, error = %e, "Failed to read position");
                return TickerOutcome::failed(symbol, Stage::Broker, e);
            }
        };

        let decision = self
            .reconciler
            .reconcile(&signal, position.as_ref(), cash, last_close, eligibility);

        match decision {
            TradeDecision::Hold { reason } => {
                info!(symbol, %reason, "Holding");
                TickerOutcome::Held {
                    symbol: symbol.to_string(),
                    signal,
                    reason,
                }
            }
            TradeDecision::Rejected { reason } => {
                warn!(symbol, %reason, "Order rejected by day-trade rule");
                TickerOutcome::Ineligible {
                    symbol: symbol.to_string(),
                    signal,
                    reason,
                }
            }
            TradeDecision::Submit(request) => {
                let request = request.with_client_order_id(Uuid::new_v4().to_string());
                let (side, quantity) = (request.side, request.quantity);

                if self.config.trading.dry_run {
                    info!(symbol, %side, %quantity, "Dry run; order not submitted");
                    return TickerOutcome::DryRun {
                        symbol: symbol.to_string(),
                        signal,
                        side,
                        quantity,
                    };
                }

                match self
                    .bounded("submit order", self.broker.submit_order(request))
                    .await
                {
                    Ok(order) => {
                        info!(
                            symbol,
                            %side,
                            %quantity,
                            order_id = %order.id,
                            status = ?order.status,
                            "Order submitted"
                        );
                        TickerOutcome::Submitted {
                            symbol: symbol.to_string(),
                            signal,
                            side,
                            quantity,
                            order_id: order.id,
                            client_order_id: order.client_order_id,
                        }
                    }
                    Err(e) => {
                        error!(symbol, %side, %quantity, error = %e, "Order submission failed");
                        TickerOutcome::failed(symbol, Stage::Broker, e)
                    }
                }
            }
        }
    }

    async fn read_account(&self) -> Result<(Decimal, Eligibility), String> {
        match self.bounded("read account", self.broker.get_account()).await {
            Ok(account) => {
                let eligibility = self.rule.check(&account);
                if let Eligibility::Ineligible {
                    equity,
                    day_trades,
                    limit,
                } = &eligibility
                {
                    warn!(%equity, day_trades, limit, "Trading window ineligible; orders rejected this cycle");
                }
                info!(
                    broker = self.broker.name(),
                    cash = %account.cash,
                    equity = %account.equity,
                    day_trades = account.day_trade_count,
                    "Read account"
                );
                Ok((account.cash, eligibility))
            }
            Err(e) => {
                error!(broker = self.broker.name(), error = %e, "Failed to read account; trading skipped");
                Err(e.to_string())
            }
        }
    }

    async fn notify(&self, body: &str) -> bool {
        let Some(notifier) = &self.notifier else {
            return false;
        };
        match self
            .bounded("send report", notifier.send(&self.config.report_subject, body))
            .await
        {
            Ok(()) => {
                info!(channel = notifier.name(), "Report sent");
                true
            }
            Err(e) => {
                error!(channel = notifier.name(), error = %e, "Failed to send report");
                false
            }
        }
    }

    /// Await an external call for at most `external_timeout_secs`.
    async fn bounded<T, E>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, AgentError>
    where
        E: Into<ExternalServiceError>,
    {
        let secs = self.config.external_timeout_secs;
        match timeout(StdDuration::from_secs(secs), call).await {
            Ok(result) => result.map_err(|e| AgentError::ExternalService(e.into())),
            Err(_) => Err(AgentError::ExternalService(ExternalServiceError::Timeout {
                operation: operation.to_string(),
                secs,
            })),
        }
    }
}
