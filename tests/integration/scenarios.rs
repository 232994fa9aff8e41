//! End-to-end trade cycles against the in-memory exchange.

use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

use triarb::engine::executor::{ExecutionReport, ExecutionSettings, Executor};
use triarb::engine::monitor::MonitorSettings;
use triarb::engine::scanner::{ScanOutcome, ScanSettings, Scanner};
use triarb::engine::{Bot, BotSettings};
use triarb::events::{ProgressLevel, ProgressSink};
use triarb::storage::TradeJournal;
use triarb::types::{LegOutcome, OrderType, Side, Terminal};

use crate::mock_exchange::{LimitBehaviour, MockExchange};

async fn scan(mock: &Arc<MockExchange>) -> ScanOutcome {
    let mut scanner = Scanner::new(mock.clone(), ScanSettings::default());
    scanner.scan_once().await.unwrap()
}

async fn run_cycle(mock: &Arc<MockExchange>, settings: ExecutionSettings) -> ExecutionReport {
    let outcome = scan(mock).await;
    let opportunity = outcome.opportunity.expect("mock market is profitable");
    Executor::new(
        mock.clone(),
        settings,
        ProgressSink::disabled(),
        CancellationToken::new(),
    )
    .execute(&opportunity, &outcome.market.filters, dec!(100))
    .await
}

fn limit_settings() -> ExecutionSettings {
    ExecutionSettings {
        use_limit_entry: true,
        monitor: MonitorSettings {
            poll_interval: Duration::from_millis(5),
            timeout: Some(Duration::from_secs(5)),
            max_deviation_percent: 1.0,
        },
        ..ExecutionSettings::default()
    }
}

fn temp_journal() -> TradeJournal {
    let mut p = std::env::temp_dir();
    p.push(format!("triarb_it_trades_{}.log", uuid::Uuid::new_v4()));
    TradeJournal::new(p)
}

#[tokio::test]
async fn test_scan_finds_profitable_cycle() {
    let mock = Arc::new(MockExchange::new());
    let outcome = scan(&mock).await;

    assert!(outcome.triangles_checked() > 0);
    let found = outcome.opportunity.unwrap();
    assert_eq!(found.triangle.symbols(), ["ETHUSDT", "ETHBTC", "BTCUSDT"]);
    assert!(found.profit_percent > 0.6 && found.profit_percent < 0.7);
}

#[tokio::test]
async fn test_full_cycle_returns_to_anchor() {
    let mock = Arc::new(MockExchange::new());
    let report = run_cycle(&mock, ExecutionSettings::default()).await;

    assert_eq!(report.terminal(), Terminal::Success);
    assert!(report.recovery.is_none());
    assert_eq!(report.trades().len(), 3);
    assert_eq!(
        mock.submitted(),
        vec![
            ("ETHUSDT".to_string(), Side::Buy, OrderType::Market),
            ("ETHBTC".to_string(), Side::Sell, OrderType::Market),
            ("BTCUSDT".to_string(), Side::Sell, OrderType::Market),
        ]
    );

    // 0.0399 ETH → 0.001995 BTC, 0.00199 BTC sold at 50500 less 0.1%.
    assert_eq!(report.state.current_asset, "USDT");
    assert_eq!(report.state.current_quantity, dec!(100.394505));
    assert_eq!(mock.balance("USDT"), dec!(1000.394505));
}

#[tokio::test]
async fn test_failed_leg_recovers_to_anchor() {
    let mock = Arc::new(MockExchange::new());
    mock.fail_orders_on("ETHBTC");

    let report = run_cycle(&mock, ExecutionSettings::default()).await;

    assert_eq!(report.terminal(), Terminal::PartialFailure);
    assert_eq!(report.legs.len(), 2);
    assert!(matches!(report.legs[1], LegOutcome::Rejected(_)));

    let Some(LegOutcome::Filled(recovery)) = &report.recovery else {
        panic!("expected a filled recovery, got {:?}", report.recovery);
    };
    assert_eq!(recovery.symbol, "ETHUSDT");
    assert_eq!(recovery.side, Side::Sell);
    assert_eq!(report.trades().len(), 2);
    assert_eq!(report.state.current_asset, "USDT");
    assert_eq!(mock.balance("USDT"), dec!(999.65025));
}

#[tokio::test]
async fn test_limit_entry_fills_middle_leg() {
    let mock = Arc::new(MockExchange::new());
    mock.set_limit_behaviour(LimitBehaviour::FillImmediately);

    let report = run_cycle(&mock, limit_settings()).await;

    assert_eq!(report.terminal(), Terminal::Success);
    let kinds: Vec<_> = mock.submitted().into_iter().map(|(_, _, t)| t).collect();
    assert_eq!(kinds, vec![OrderType::Market, OrderType::Limit, OrderType::Market]);
    assert_eq!(report.trades()[1].order_type, OrderType::Limit);
    assert_eq!(mock.balance("USDT"), dec!(1000.394505));
}

#[tokio::test]
async fn test_limit_entry_cancelled_on_deviation() {
    let mock = Arc::new(MockExchange::new());
    mock.set_limit_behaviour(LimitBehaviour::NeverFill);
    mock.set_book_drift(1.05);

    let report = run_cycle(&mock, limit_settings()).await;

    assert!(matches!(report.legs[1], LegOutcome::Cancelled(_)));
    assert_eq!(mock.cancelled().len(), 1);
    assert_eq!(report.terminal(), Terminal::PartialFailure);
    assert_eq!(report.state.current_asset, "USDT");
}

#[tokio::test]
async fn test_partial_limit_fill_is_swept_back() {
    let mock = Arc::new(MockExchange::new());
    mock.set_limit_behaviour(LimitBehaviour::FillHalf);
    mock.set_book_drift(1.05);

    let report = run_cycle(&mock, limit_settings()).await;

    let LegOutcome::PartiallyFilled { trade, .. } = &report.legs[1] else {
        panic!("expected a partial fill, got {:?}", report.legs[1]);
    };
    assert_eq!(trade.symbol, "ETHBTC");
    assert_eq!(mock.cancelled().len(), 1);

    let Some(LegOutcome::Filled(recovery)) = &report.recovery else {
        panic!("expected a filled recovery, got {:?}", report.recovery);
    };
    assert_eq!(recovery.symbol, "ETHUSDT");
    let Some(LegOutcome::Filled(residual)) = &report.residual else {
        panic!("expected a filled sweep, got {:?}", report.residual);
    };
    assert_eq!(residual.symbol, "BTCUSDT");

    assert_eq!(report.terminal(), Terminal::PartialFailure);
    assert_eq!(report.trades().len(), 4);
    assert_eq!(report.state.current_asset, "USDT");
    assert!(mock.balance("BTC") < dec!(0.00001));
    assert!(mock.balance("ETH") < dec!(0.0001));
}

#[tokio::test]
async fn test_bot_journals_trades_and_stops() {
    let mock = Arc::new(MockExchange::new());
    let journal = temp_journal();
    let path = journal.path().to_path_buf();

    let settings = BotSettings {
        usdt_amount: dec!(100),
        scan_interval: Duration::from_secs(3600),
        ..BotSettings::default()
    };
    let (progress, mut rx) = ProgressSink::channel();
    let handle = Bot::new(mock.clone(), settings, progress)
        .with_journal(journal)
        .start();

    loop {
        let event = rx.recv().await.unwrap();
        if event.message.starts_with("Expected final value") {
            break;
        }
    }

    handle.stop();
    assert_ok!(handle.join().await);

    let records = TradeJournal::new(&path).load().unwrap();
    let symbols: Vec<_> = records.iter().map(|t| t.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["ETHUSDT", "ETHBTC", "BTCUSDT"]);

    std::fs::remove_file(path).unwrap();
}

#[tokio::test]
async fn test_bot_survives_exchange_outage() {
    let mock = Arc::new(MockExchange::new());
    mock.set_error("HTTP 503 Service Unavailable");

    let settings = BotSettings {
        scan_interval: Duration::from_secs(3600),
        error_backoff: Duration::from_millis(10),
        ..BotSettings::default()
    };
    let (progress, mut rx) = ProgressSink::channel();
    let handle = Bot::new(mock.clone(), settings, progress).start();

    loop {
        let event = rx.recv().await.unwrap();
        if event.level == ProgressLevel::Error {
            assert!(event.message.contains("HTTP 503"));
            break;
        }
    }
    mock.clear_error();

    loop {
        let event = rx.recv().await.unwrap();
        if event.message.starts_with("🔍 Checked") {
            break;
        }
    }

    handle.stop();
    assert_ok!(handle.join().await);
}
