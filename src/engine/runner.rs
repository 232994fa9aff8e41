//! Bot lifecycle and the scan loop.
//!
//! `Bot::start` spawns a single worker task and hands back a `BotHandle`.
//! The worker scans, executes at most one triangle per tick, journals the
//! resulting trades and sleeps. Errors end the tick, not the loop; only
//! the handle's cancellation token stops it.

use anyhow::{Context, Result};
use rust_decimal::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::executor::{ExecutionReport, ExecutionSettings, Executor};
use super::scanner::{ScanSettings, Scanner};
use crate::events::ProgressSink;
use crate::exchange::Exchange;
use crate::storage::TradeJournal;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Anchor amount committed to each trade cycle.
    pub usdt_amount: Decimal,
    pub scan_interval: Duration,
    pub error_backoff: Duration,
    pub scan: ScanSettings,
    pub execution: ExecutionSettings,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            usdt_amount: Decimal::from(20),
            scan_interval: Duration::from_secs(5),
            error_backoff: Duration::from_secs(5),
            scan: ScanSettings::default(),
            execution: ExecutionSettings::default(),
        }
    }
}

/// What one tick of the loop did.
#[derive(Debug)]
pub enum TickOutcome {
    NoOpportunity,
    Executed(ExecutionReport),
}

// ---------------------------------------------------------------------------
// Bot
// ---------------------------------------------------------------------------

pub struct Bot {
    exchange: Arc<dyn Exchange>,
    settings: BotSettings,
    progress: ProgressSink,
    journal: Option<TradeJournal>,
}

impl Bot {
    pub fn new(exchange: Arc<dyn Exchange>, settings: BotSettings, progress: ProgressSink) -> Self {
        Self {
            exchange,
            settings,
            progress,
            journal: None,
        }
    }

    /// Append every completed trade to `journal`.
    pub fn with_journal(mut self, journal: TradeJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Spawn the worker.
    pub fn start(self) -> BotHandle {
        let cancel = CancellationToken::new();
        let worker = BotWorker::new(self, cancel.clone());
        let join = tokio::spawn(worker.run());
        BotHandle { cancel, join }
    }
}

/// Owned by whoever started the bot.
pub struct BotHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl BotHandle {
    /// Ask the worker to stop. An in-flight market order still completes;
    /// a resting limit order is cancelled.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }

    /// Wait for the worker to exit.
    pub async fn join(self) -> Result<()> {
        self.join.await.context("Bot worker panicked")
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

struct BotWorker {
    scanner: Scanner,
    executor: Executor,
    settings: BotSettings,
    progress: ProgressSink,
    journal: Option<TradeJournal>,
    cancel: CancellationToken,
}

impl BotWorker {
    fn new(bot: Bot, cancel: CancellationToken) -> Self {
        let scanner = Scanner::new(bot.exchange.clone(), bot.settings.scan.clone());
        let executor = Executor::new(
            bot.exchange,
            bot.settings.execution.clone(),
            bot.progress.clone(),
            cancel.clone(),
        );
        Self {
            scanner,
            executor,
            settings: bot.settings,
            progress: bot.progress,
            journal: bot.journal,
            cancel,
        }
    }

    async fn run(mut self) {
        info!(
            amount = %self.settings.usdt_amount,
            threshold = self.settings.scan.threshold_percent,
            anchor = %self.settings.scan.anchor,
            "Bot worker started"
        );
        self.progress.info("🔁 Starting trading bot...");

        while !self.cancel.is_cancelled() {
            let pause = match self.tick().await {
                Ok(_) => self.settings.scan_interval,
                Err(e) => {
                    let message = format!("{e:#}");
                    error!(error = %message, "Scan iteration failed");
                    self.progress.error(format!("❌ Error: {message}"));
                    self.settings.error_backoff
                }
            };

            if !sleep_or_cancel(pause, &self.cancel).await {
                break;
            }
        }

        info!("Bot worker stopped");
        self.progress.info("🛑 Bot stopped.");
    }

    async fn tick(&mut self) -> Result<TickOutcome> {
        let scan = self.scanner.scan_once().await?;
        self.progress.info(format!(
            "🔍 Checked {} {}-based triangles",
            scan.triangles_checked(),
            self.settings.scan.anchor
        ));

        let Some(found) = scan.opportunity else {
            self.progress.info("No profitable trades found.");
            return Ok(TickOutcome::NoOpportunity);
        };

        self.progress
            .info(format!("🏅 Best Profit: {:.4}%", found.profit_percent));
        for step in &found.steps {
            self.progress.info(format!(" - {step}"));
        }

        let report = self
            .executor
            .execute(&found, &scan.market.filters, self.settings.usdt_amount)
            .await;

        if let Some(journal) = &self.journal {
            journal
                .append(report.trades())
                .context("Failed to journal trades")?;
        }

        let stake = self.settings.usdt_amount.to_f64().unwrap_or_default();
        self.progress.info(format!(
            "Expected final value: {}",
            found.expected_final_value(stake)
        ));

        Ok(TickOutcome::Executed(report))
    }
}

/// Sleep for `duration` unless cancelled first. Returns `false` on
/// cancellation.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
