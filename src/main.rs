//! TRIARB — triangular arbitrage bot for Binance spot
//!
//! Entry point. Loads configuration, initialises structured logging,
//! verifies the exchange account, then runs the scan loop until Ctrl+C
//! and shuts the worker down cooperatively.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

use triarb::config::AppConfig;
use triarb::engine::Bot;
use triarb::events::{ProgressEvent, ProgressSink};
use triarb::exchange::binance::BinanceClient;
use triarb::exchange::Exchange;
use triarb::storage::TradeJournal;
use triarb::types::BotError;

const BANNER: &str = r#"
 _____ ____  ___    _    ____  ____
|_   _|  _ \|_ _|  / \  |  _ \| __ )
  | | | |_) || |  / _ \ | |_) |  _ \
  | | |  _ < | | / ___ \|  _ <| |_) |
  |_| |_| \_\___/_/   \_\_| \_\____/

  Triangular arbitrage on Binance spot
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let cfg = AppConfig::load(&config_path)?;
    cfg.validate()?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        amount = cfg.bot.usdt_amount,
        threshold = cfg.bot.threshold_percent,
        use_limit_entry = cfg.bot.use_limit_entry,
        max_deviation = cfg.bot.max_deviation_percent,
        anchor = %cfg.bot.anchor_asset,
        "TRIARB starting up"
    );

    // -- Exchange --------------------------------------------------------

    let credentials = cfg.credentials()?;
    let client = BinanceClient::new(
        credentials.api_key,
        credentials.api_secret,
        cfg.exchange.base_url.clone(),
        cfg.request_timeout(),
    )?
    .with_recv_window(cfg.exchange.recv_window_ms);

    // The worker never starts on bad credentials.
    if let Err(e) = client.verify_account().await {
        let err = BotError::Config(format!("Invalid API credentials: {e:#}"));
        error!(error = %err, "Account verification failed");
        return Err(err.into());
    }
    info!(exchange = client.name(), "Account verified");

    // -- Bot -------------------------------------------------------------

    let (progress, events) = ProgressSink::channel();
    let viewer = tokio::spawn(print_progress(events));

    let settings = cfg.bot_settings()?;
    let journal = TradeJournal::new(&cfg.execution.trade_log_path);
    let handle = Bot::new(Arc::new(client), settings, progress)
        .with_journal(journal)
        .start();

    info!(
        interval_secs = cfg.bot.scan_interval_secs,
        trade_log = %cfg.execution.trade_log_path,
        "Bot started. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping bot...");

    handle.stop();
    handle.join().await?;
    // The sink was moved into the worker; the viewer ends once it is dropped.
    let _ = viewer.await;

    info!("TRIARB shut down cleanly.");
    Ok(())
}

/// Console viewer for progress events.
async fn print_progress(mut events: UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = events.recv().await {
        println!("{event}");
    }
}

/// Initialise the `tracing` subscriber.
///
/// Progress events are printed by the console viewer, so their `tracing`
/// mirror is limited to warnings unless `RUST_LOG` says otherwise.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("triarb=info,triarb::progress=warn"));

    let json_logging = std::env::var("TRIARB_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
