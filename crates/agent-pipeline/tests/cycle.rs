use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use agent_broker::PaperBroker;
use agent_core::error::{BrokerError, DataError, NotifyError};
use agent_core::traits::{Broker, DataSource, Notifier};
use agent_core::types::{Account, Bar, Order, OrderRequest, Position, Timeframe};
use agent_model::ForestConfig;
use agent_pipeline::{
    CycleConfig, CycleMode, ReportMode, Stage, TickerOutcome, TradingCycle, NO_DATA_REPORT,
};
use agent_risk::Eligibility;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const DAY_MS: i64 = 86_400_000;

fn wave_bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + (t * 0.4).sin() * 5.0 + t * 0.05;
            let volume = 1_000.0 + ((t * 0.7).cos() + 1.5) * 300.0;
            Bar::new(
                1_700_000_000_000 + i as i64 * DAY_MS,
                close - 0.5,
                close + 1.0,
                close - 1.0,
                close,
                volume,
            )
        })
        .collect()
}

fn bar(timestamp: i64, close: f64) -> Bar {
    Bar::new(timestamp, close, close, close, close, 10.0)
}

/// Strictly rising closes ending at `last`, so every label is up.
fn rising_bars(n: usize, last: f64) -> Vec<Bar> {
    (0..n)
        .map(|i| bar(1_700_000_000_000 + i as i64 * DAY_MS, last - (n - 1 - i) as f64 * 0.5))
        .collect()
}

/// Serves fixed bars per symbol, ignoring the range.
struct FixedSource {
    bars: Vec<(String, Vec<Bar>)>,
    delay: Option<StdDuration>,
}

impl FixedSource {
    fn new(bars: Vec<(&str, Vec<Bar>)>) -> Self {
        Self {
            bars: bars.into_iter().map(|(s, b)| (s.to_string(), b)).collect(),
            delay: None,
        }
    }
}

#[async_trait]
impl DataSource for FixedSource {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.bars
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, b)| b.clone())
            .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Broker whose account endpoint is down.
struct DownBroker;

#[async_trait]
impl Broker for DownBroker {
    async fn get_account(&self) -> Result<Account, BrokerError> {
        Err(BrokerError::Connection("connection refused".into()))
    }

    async fn get_position(&self, _symbol: &str) -> Result<Option<Position>, BrokerError> {
        Err(BrokerError::Connection("connection refused".into()))
    }

    async fn submit_order(&self, _request: OrderRequest) -> Result<Order, BrokerError> {
        Err(BrokerError::Connection("connection refused".into()))
    }

    fn name(&self) -> &str {
        "down"
    }
}

/// Reports queued cash balances, one per account read, and records orders.
struct ScriptedBroker {
    cash: Mutex<Vec<Decimal>>,
    day_trades: u32,
    positions_down: bool,
    account_reads: Mutex<usize>,
    submitted: Mutex<Vec<OrderRequest>>,
}

impl ScriptedBroker {
    fn new(cash: Vec<Decimal>) -> Self {
        Self {
            cash: Mutex::new(cash),
            day_trades: 0,
            positions_down: false,
            account_reads: Mutex::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Broker for ScriptedBroker {
    async fn get_account(&self) -> Result<Account, BrokerError> {
        *self.account_reads.lock().unwrap() += 1;
        let mut cash = self.cash.lock().unwrap();
        let current = if cash.len() > 1 { cash.remove(0) } else { cash[0] };
        Ok(Account::new(current).with_day_trades(self.day_trades))
    }

    async fn get_position(&self, _symbol: &str) -> Result<Option<Position>, BrokerError> {
        if self.positions_down {
            return Err(BrokerError::Connection("connection reset".into()));
        }
        Ok(None)
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<Order, BrokerError> {
        let order = Order::from_request(&request);
        self.submitted.lock().unwrap().push(request);
        Ok(order)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Delivery("503".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn config() -> CycleConfig {
    CycleConfig {
        model: ForestConfig {
            n_trees: 15,
            ..ForestConfig::default()
        },
        ..CycleConfig::default()
    }
}

fn tickers(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

// Holding shares and cash makes both BUY and SELL produce an order.
fn funded_broker() -> PaperBroker {
    PaperBroker::new(dec!(10000)).with_position("AAPL", dec!(10), dec!(90))
}

#[tokio::test]
async fn test_cycle_submits_and_skips_missing_ticker() {
    let source = Arc::new(FixedSource::new(vec![("AAPL", wave_bars(120))]));
    let broker = funded_broker();
    let notifier = Arc::new(RecordingNotifier::default());
    let cycle = TradingCycle::new(
        config(),
        source,
        Arc::new(broker.clone()),
        Some(notifier.clone() as Arc<dyn Notifier>),
    )
    .unwrap();

    let report = cycle.run(&tickers(&["AAPL", "ZZZZ"])).await;

    assert_eq!(report.mode, CycleMode::Trade);
    assert_eq!(report.outcomes.len(), 2);
    match &report.outcomes[0] {
        TickerOutcome::Submitted {
            symbol,
            quantity,
            client_order_id,
            ..
        } => {
            assert_eq!(symbol, "AAPL");
            assert!(*quantity > dec!(0));
            assert_eq!(quantity.fract(), dec!(0));
            assert_eq!(client_order_id.len(), 36);
        }
        other => panic!("expected a submitted order, got {:?}", other),
    }
    assert!(matches!(
        &report.outcomes[1],
        TickerOutcome::Failed { symbol, stage: Stage::Fetch, .. } if symbol == "ZZZZ"
    ));

    assert_eq!(broker.orders().unwrap().len(), 1);
    assert_eq!(report.training.len(), 1);
    assert_eq!(report.eligibility, Some(Eligibility::Eligible));
    assert_eq!(report.failures(), 1);

    assert!(report.report_text.starts_with("Daily Trading Report:\nTickers: AAPL\n"));
    assert!(report.report_text.contains("Cycle Summary:"));
    assert!(report.report_text.contains("ZZZZ: failed at fetch"));

    assert!(report.notified);
    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Daily Trading Report");
    assert_eq!(sent[0].1, report.report_text);
}

#[tokio::test]
async fn test_day_trade_limit_rejects_orders() {
    let source = Arc::new(FixedSource::new(vec![("AAPL", wave_bars(120))]));
    let broker = funded_broker().with_day_trades(3);
    let cycle = TradingCycle::new(config(), source, Arc::new(broker.clone()), None).unwrap();

    let report = cycle.run(&tickers(&["AAPL"])).await;

    assert!(matches!(report.outcomes[0], TickerOutcome::Ineligible { .. }));
    assert!(matches!(
        report.eligibility,
        Some(Eligibility::Ineligible { day_trades: 3, limit: 3, .. })
    ));
    assert!(broker.orders().unwrap().is_empty());
    // reporting still runs
    assert!(report.report_text.contains("Profit/Loss:"));
    assert!(!report.notified);
}

#[tokio::test]
async fn test_each_buy_sizes_from_broker_cash() {
    let source = Arc::new(FixedSource::new(vec![
        ("AAA", rising_bars(120, 100.0)),
        ("BBB", rising_bars(120, 100.0)),
    ]));
    // cash the broker reports after the first order is lower than 1000 - 300
    let broker = Arc::new(ScriptedBroker::new(vec![dec!(1000), dec!(400)]));
    let cycle = TradingCycle::new(config(), source, broker.clone(), None).unwrap();

    let report = cycle.run(&tickers(&["AAA", "BBB"])).await;

    assert_eq!(report.failures(), 0);
    assert_eq!(*broker.account_reads.lock().unwrap(), 2);
    let submitted = broker.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].symbol, "AAA");
    assert_eq!(submitted[0].quantity, dec!(3)); // floor(1000 * 0.3 / 100)
    assert_eq!(submitted[1].symbol, "BBB");
    assert_eq!(submitted[1].quantity, dec!(1)); // floor(400 * 0.3 / 100)
}

#[tokio::test]
async fn test_ineligible_cycle_skips_position_reads() {
    let source = Arc::new(FixedSource::new(vec![
        ("AAA", rising_bars(120, 100.0)),
        ("BBB", rising_bars(120, 100.0)),
    ]));
    let broker = Arc::new(ScriptedBroker {
        day_trades: 3,
        positions_down: true,
        ..ScriptedBroker::new(vec![dec!(1000)])
    });
    let cycle = TradingCycle::new(config(), source, broker.clone(), None).unwrap();

    let report = cycle.run(&tickers(&["AAA", "BBB"])).await;

    assert_eq!(report.outcomes.len(), 2);
    for outcome in &report.outcomes {
        assert!(matches!(outcome, TickerOutcome::Ineligible { .. }), "{:?}", outcome);
    }
    assert_eq!(*broker.account_reads.lock().unwrap(), 1);
    assert!(broker.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_dry_run_submits_nothing() {
    let source = Arc::new(FixedSource::new(vec![("AAPL", wave_bars(120))]));
    let broker = funded_broker();
    let mut config = config();
    config.trading.dry_run = true;
    let cycle = TradingCycle::new(config, source, Arc::new(broker.clone()), None).unwrap();

    let report = cycle.run(&tickers(&["AAPL"])).await;

    assert!(matches!(report.outcomes[0], TickerOutcome::DryRun { .. }));
    assert!(broker.orders().unwrap().is_empty());
}

#[tokio::test]
async fn test_short_history_fails_at_features() {
    let source = Arc::new(FixedSource::new(vec![
        ("AAPL", wave_bars(20)),
        ("MSFT", wave_bars(120)),
    ]));
    let broker = PaperBroker::new(dec!(10000)).with_position("MSFT", dec!(5), dec!(90));
    let cycle = TradingCycle::new(config(), source, Arc::new(broker), None).unwrap();

    let report = cycle.run(&tickers(&["AAPL", "MSFT"])).await;

    assert!(matches!(
        report.outcomes[0],
        TickerOutcome::Failed { stage: Stage::Features, .. }
    ));
    assert!(!report.outcomes[1].is_failure());
    // the short ticker's bars still count toward the report
    assert!(report.report_text.contains("Tickers: AAPL, MSFT\n"));
}

#[tokio::test]
async fn test_account_failure_skips_trading() {
    let source = Arc::new(FixedSource::new(vec![
        ("AAPL", wave_bars(120)),
        ("MSFT", wave_bars(120)),
    ]));
    let cycle = TradingCycle::new(config(), source, Arc::new(DownBroker), None).unwrap();

    let report = cycle.run(&tickers(&["AAPL", "MSFT"])).await;

    for outcome in &report.outcomes {
        match outcome {
            TickerOutcome::Failed { stage, error, .. } => {
                assert_eq!(*stage, Stage::Broker);
                assert!(error.contains("account unavailable"));
            }
            other => panic!("expected broker failure, got {:?}", other),
        }
    }
    assert!(report.eligibility.is_none());
}

#[tokio::test]
async fn test_signals_mode_never_calls_broker() {
    let source = Arc::new(FixedSource::new(vec![("AAPL", wave_bars(120))]));
    let cycle = TradingCycle::new(config(), source, Arc::new(DownBroker), None).unwrap();

    let report = cycle.signals(&tickers(&["AAPL"])).await;

    assert_eq!(report.mode, CycleMode::SignalsOnly);
    assert!(matches!(report.outcomes[0], TickerOutcome::Signalled { .. }));
    let signals = report.signals();
    assert_eq!(signals.len(), 1);
    assert!(signals[0].is_actionable());
    assert!((0.0..=1.0).contains(&signals[0].confidence));
}

#[tokio::test]
async fn test_signals_are_reproducible() {
    let source: Arc<dyn DataSource> =
        Arc::new(FixedSource::new(vec![("AAPL", wave_bars(150))]));
    let cycle = TradingCycle::new(config(), source, Arc::new(DownBroker), None).unwrap();

    let first = cycle.signals(&tickers(&["AAPL"])).await;
    let second = cycle.signals(&tickers(&["AAPL"])).await;

    assert_eq!(first.signals(), second.signals());
    assert_eq!(first.training, second.training);
}

#[tokio::test]
async fn test_report_without_data() {
    let source = Arc::new(FixedSource::new(vec![]));
    let notifier = Arc::new(RecordingNotifier::default());
    let cycle = TradingCycle::new(
        config(),
        source,
        Arc::new(DownBroker),
        Some(notifier.clone() as Arc<dyn Notifier>),
    )
    .unwrap();

    let report = cycle.report(&tickers(&["AAPL", "MSFT"])).await;

    assert_eq!(report.report_text, NO_DATA_REPORT);
    assert_eq!(report.failures(), 2);
    assert_eq!(notifier.sent.lock().unwrap()[0].1, NO_DATA_REPORT);
}

#[tokio::test]
async fn test_report_mode_and_disabled_trading() {
    let source = Arc::new(FixedSource::new(vec![
        ("AAPL", vec![bar(1, 100.0), bar(2, 103.0)]),
        ("MSFT", vec![bar(1, 50.0), bar(2, 49.0)]),
    ]));
    let mut config = config();
    config.trading.enabled = false;
    config.report_mode = ReportMode::Combined;
    let cycle = TradingCycle::new(config, source, Arc::new(DownBroker), None).unwrap();

    let report = cycle.run(&tickers(&["AAPL", "MSFT"])).await;

    assert_eq!(report.mode, CycleMode::ReportOnly);
    assert_eq!(
        report.report_text,
        "Daily Trading Report:\nTickers: AAPL, MSFT\nProfit/Loss: -51.00\n"
    );
    assert!(matches!(report.outcomes[0], TickerOutcome::Fetched { bars: 2, .. }));
}

#[tokio::test]
async fn test_slow_source_times_out() {
    let mut source = FixedSource::new(vec![("AAPL", wave_bars(120))]);
    source.delay = Some(StdDuration::from_secs(5));
    let mut config = config();
    config.external_timeout_secs = 0;
    let cycle = TradingCycle::new(config, Arc::new(source), Arc::new(DownBroker), None).unwrap();

    let report = cycle.report(&tickers(&["AAPL"])).await;

    match &report.outcomes[0] {
        TickerOutcome::Failed { stage, error, .. } => {
            assert_eq!(*stage, Stage::Fetch);
            assert!(error.contains("timed out"));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_notifier_failure_is_not_fatal() {
    let source = Arc::new(FixedSource::new(vec![("AAPL", wave_bars(60))]));
    let notifier = Arc::new(RecordingNotifier {
        fail: true,
        ..Default::default()
    });
    let cycle = TradingCycle::new(config(), source, Arc::new(DownBroker), Some(notifier as Arc<dyn Notifier>))
        .unwrap();

    let report = cycle.report(&tickers(&["AAPL"])).await;

    assert!(!report.notified);
    assert!(report.report_text.starts_with("Daily Trading Report:"));
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = config();
    config.features.short_window = 60;
    let source = Arc::new(FixedSource::new(vec![]));
    assert!(TradingCycle::new(config, source, Arc::new(DownBroker), None).is_err());
}
