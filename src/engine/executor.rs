//! Trade executor.
//!
//! Runs one triangle as a sequential three-leg state machine, tracking
//! which asset is held and how much of it after fees. A leg that does
//! not fill aborts the remaining legs without rollback; whatever is held
//! at that point is converted back into the anchor asset, and so is the
//! executed part of a partially filled leg.

use rust_decimal::prelude::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::monitor::{LimitOrderMonitor, MonitorSettings};
use crate::events::ProgressSink;
use crate::exchange::filters::FilterBook;
use crate::exchange::Exchange;
use crate::types::{
    ArbitrageResult, BotError, Direction, ExecutionState, Hop, LegOutcome, Side, Terminal,
    TradeConfirmation, ANCHOR_ASSET,
};

/// Only this leg may rest as a limit order.
const LIMIT_LEG: usize = 1;

// ---------------------------------------------------------------------------
// Side selection
// ---------------------------------------------------------------------------

/// Order side for a hop.
///
/// Buying a `BASE/QUOTE` pair spends QUOTE and selling it spends BASE,
/// so a quote → base hop buys when the engine holds the hop's `from`
/// asset and sells otherwise, and a base → quote hop does the reverse.
pub fn side_for(direction: Direction, holds_from: bool) -> Side {
    match (direction, holds_from) {
        (Direction::QuoteToBase, true) => Side::Buy,
        (Direction::QuoteToBase, false) => Side::Sell,
        (Direction::BaseToQuote, true) => Side::Sell,
        (Direction::BaseToQuote, false) => Side::Buy,
    }
}

// ---------------------------------------------------------------------------
// Execution result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    pub anchor: String,
    pub use_limit_entry: bool,
    pub monitor: MonitorSettings,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            anchor: ANCHOR_ASSET.to_string(),
            use_limit_entry: false,
            monitor: MonitorSettings::default(),
        }
    }
}

/// Everything that happened during one trade cycle.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub state: ExecutionState,
    /// One entry per attempted leg, in order.
    pub legs: Vec<LegOutcome>,
    /// Conversion back to the anchor, if one was needed.
    pub recovery: Option<LegOutcome>,
    /// Conversion of a partially filled leg's proceeds back to the anchor.
    pub residual: Option<LegOutcome>,
}

impl ExecutionReport {
    pub fn terminal(&self) -> Terminal {
        self.state.terminal.unwrap_or(Terminal::PartialFailure)
    }

    /// Trades to record in the journal, recovery included.
    pub fn trades(&self) -> &[TradeConfirmation] {
        &self.state.completed_trades
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

pub struct Executor {
    exchange: Arc<dyn Exchange>,
    settings: ExecutionSettings,
    progress: ProgressSink,
    cancel: CancellationToken,
}

impl Executor {
    pub fn new(
        exchange: Arc<dyn Exchange>,
        settings: ExecutionSettings,
        progress: ProgressSink,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            exchange,
            settings,
            progress,
            cancel,
        }
    }

    pub fn settings(&self) -> &ExecutionSettings {
        &self.settings
    }

    /// Execute `opportunity` starting from `amount` of the anchor asset.
    ///
    /// Never fails: every error is folded into a leg outcome and the
    /// terminal state.
    pub async fn execute(
        &self,
        opportunity: &ArbitrageResult,
        filters: &FilterBook,
        amount: Decimal,
    ) -> ExecutionReport {
        let anchor = self.settings.anchor.as_str();
        let reference_price = opportunity.reference_price();
        let mut state = ExecutionState::new(anchor, amount);
        let mut legs = Vec::with_capacity(3);
        let mut stranded = None;

        info!(triangle = %opportunity.triangle, %amount, "Executing triangle");

        for (index, hop) in opportunity.triangle.hops.iter().enumerate() {
            let side = side_for(hop.direction, state.holds(&hop.from));
            let outcome = self
                .execute_leg(index, hop, side, &state, reference_price, filters)
                .await;

            match &outcome {
                LegOutcome::Filled(trade) => {
                    state.advance(&hop.to, trade.clone());
                    info!(
                        leg = index,
                        symbol = %hop.symbol,
                        %side,
                        asset = %state.current_asset,
                        qty = %state.current_quantity,
                        "Leg filled"
                    );
                }
                LegOutcome::PartiallyFilled { trade, .. } => {
                    let received = trade.net_received(&hop.to);
                    state.completed_trades.push(trade.clone());
                    warn!(
                        leg = index,
                        symbol = %hop.symbol,
                        %side,
                        asset = %hop.to,
                        qty = %received,
                        "Leg partially filled"
                    );
                    self.progress.error(format!(
                        "❌ Leg {} on {} only partially filled, {received} {} to convert back.",
                        index + 1,
                        hop.symbol,
                        hop.to
                    ));
                    self.progress.warn("⚠️ Stopping due to failed trade.");
                    stranded = Some(hop.to.clone());
                }
                failed => {
                    warn!(
                        leg = index,
                        symbol = %hop.symbol,
                        %side,
                        outcome = %failed,
                        "Leg failed"
                    );
                    self.progress.warn("⚠️ Stopping due to failed trade.");
                }
            }

            let filled = outcome.is_filled();
            legs.push(outcome);
            if !filled {
                break;
            }
        }

        let all_filled = legs.len() == 3 && legs.iter().all(LegOutcome::is_filled);

        let recovery = if state.holds(anchor) {
            None
        } else {
            Some(self.recover(&mut state, filters).await)
        };
        let residual = match stranded {
            Some(asset) if asset != anchor => {
                Some(self.sweep_residual(&mut state, &asset, filters).await)
            }
            _ => None,
        };

        let recovered = [&recovery, &residual]
            .into_iter()
            .flatten()
            .all(LegOutcome::is_filled);
        let terminal = if !recovered {
            Terminal::RecoveryFailure
        } else if all_filled {
            Terminal::Success
        } else {
            Terminal::PartialFailure
        };
        state.terminal = Some(terminal);

        info!(
            %terminal,
            asset = %state.current_asset,
            qty = %state.current_quantity,
            trades = state.completed_trades.len(),
            "Trade cycle finished"
        );
        self.progress.info(format!(
            "✅ Final asset: {} | Final amount: {:.6} ({terminal})",
            state.current_asset, state.current_quantity
        ));

        ExecutionReport {
            state,
            legs,
            recovery,
            residual,
        }
    }

    async fn execute_leg(
        &self,
        index: usize,
        hop: &Hop,
        side: Side,
        state: &ExecutionState,
        reference_price: f64,
        filters: &FilterBook,
    ) -> LegOutcome {
        let symbol = hop.symbol.as_str();
        let held = state.current_quantity;

        if index == LIMIT_LEG && self.settings.use_limit_entry {
            match limit_order_quantity(side, held, reference_price) {
                Some((price, quantity)) => {
                    let notional = price * quantity;
                    match filters.min_notional(symbol) {
                        Some(min) if notional > min => {
                            let monitor = LimitOrderMonitor::new(
                                self.exchange.as_ref(),
                                filters,
                                &self.settings.monitor,
                                &self.progress,
                                &self.cancel,
                            );
                            return monitor.run(symbol, side, quantity, price).await;
                        }
                        Some(min) => {
                            info!(
                                %symbol,
                                %notional,
                                %min,
                                "Notional below minimum, using market order"
                            );
                            self.progress
                                .warn("🚨 Moving to market order due to minNotional");
                        }
                        None => {
                            self.progress.warn(format!(
                                "🚨 No minNotional filter for {symbol}, moving to market order"
                            ));
                        }
                    }
                }
                None => {
                    self.progress.warn(format!(
                        "🚨 Unusable reference price {reference_price} for {symbol}, moving to market order"
                    ));
                }
            }
        }

        self.market_order(symbol, side, held, filters).await
    }

    async fn market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        filters: &FilterBook,
    ) -> LegOutcome {
        let quantity = match filters.round_quantity(symbol, quantity) {
            Ok(q) => q,
            Err(e) => {
                self.progress
                    .error(format!("❌ Error executing {side} on {symbol}: {e}"));
                return LegOutcome::Rejected(e.to_string());
            }
        };

        match self.place_market(symbol, side, quantity).await {
            Ok(trade) => {
                self.progress.info(format!(
                    "✅ Executed MARKET {side} order on {symbol}: {quantity} -> {}",
                    trade.gross_received()
                ));
                LegOutcome::Filled(trade)
            }
            Err(e) => {
                let err = BotError::OrderRejected {
                    symbol: symbol.to_string(),
                    reason: format!("{e:#}"),
                };
                self.progress.error(format!("❌ {err}"));
                LegOutcome::Rejected(err.to_string())
            }
        }
    }

    /// MARKET BUY spends `quantity` of the quote asset; MARKET SELL sells
    /// `quantity` of the base asset.
    async fn place_market(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
    ) -> anyhow::Result<TradeConfirmation> {
        match side {
            Side::Buy => self.exchange.market_buy(symbol, quantity).await,
            Side::Sell => self.exchange.market_sell(symbol, quantity).await,
        }
    }

    /// Convert the held asset back into the anchor.
    async fn recover(&self, state: &mut ExecutionState, filters: &FilterBook) -> LegOutcome {
        let anchor = self.settings.anchor.clone();
        let asset = state.current_asset.clone();

        match self.convert_to_anchor(&asset, filters).await {
            Ok(trade) => {
                state.advance(&anchor, trade.clone());
                info!(symbol = %trade.symbol, qty = %state.current_quantity, "Recovered to anchor");
                LegOutcome::Filled(trade)
            }
            Err(reason) => self.recovery_failed(&asset, reason),
        }
    }

    /// Convert the proceeds of a partially filled leg back into the anchor.
    async fn sweep_residual(
        &self,
        state: &mut ExecutionState,
        asset: &str,
        filters: &FilterBook,
    ) -> LegOutcome {
        let anchor = self.settings.anchor.clone();

        match self.convert_to_anchor(asset, filters).await {
            Ok(trade) => {
                state.absorb(&anchor, trade.clone());
                info!(symbol = %trade.symbol, %asset, "Swept partial fill back to anchor");
                LegOutcome::Filled(trade)
            }
            Err(reason) => self.recovery_failed(asset, reason),
        }
    }

    /// Sell the free balance of `asset` on `{asset}{anchor}`, falling back
    /// to a buy on `{anchor}{asset}`. The error names both attempts.
    async fn convert_to_anchor(
        &self,
        asset: &str,
        filters: &FilterBook,
    ) -> Result<TradeConfirmation, String> {
        let anchor = self.settings.anchor.as_str();

        self.progress
            .info(format!("🔁 Converting remaining {asset} back to {anchor}..."));

        let balance = self
            .exchange
            .free_balance(asset)
            .await
            .map_err(|e| format!("{e:#}"))?;

        let direct = format!("{asset}{anchor}");
        let inverse = format!("{anchor}{asset}");

        let direct_err = match self.recovery_attempt(&direct, Side::Sell, balance, filters).await {
            Ok(trade) => return Ok(self.converted(trade)),
            Err(e) => format!("{e:#}"),
        };
        warn!(symbol = %direct, error = %direct_err, "Direct recovery failed, trying inverse pair");

        match self.recovery_attempt(&inverse, Side::Buy, balance, filters).await {
            Ok(trade) => Ok(self.converted(trade)),
            Err(e) => Err(format!("{direct}: {direct_err}; {inverse}: {e:#}")),
        }
    }

    fn converted(&self, trade: TradeConfirmation) -> TradeConfirmation {
        self.progress.info(format!(
            "✅ Successfully converted back to {} via {}",
            self.settings.anchor, trade.symbol
        ));
        trade
    }

    async fn recovery_attempt(
        &self,
        symbol: &str,
        side: Side,
        balance: Decimal,
        filters: &FilterBook,
    ) -> anyhow::Result<TradeConfirmation> {
        if !filters.contains(symbol) {
            return Err(BotError::UnknownSymbol(symbol.to_string()).into());
        }
        let quantity = filters.round_quantity(symbol, balance)?;
        self.place_market(symbol, side, quantity).await
    }

    fn recovery_failed(&self, asset: &str, reason: String) -> LegOutcome {
        let err = BotError::RecoveryFailed {
            asset: asset.to_string(),
            anchor: self.settings.anchor.clone(),
            reason,
        };
        error!(error = %err, "Recovery failed, funds stranded");
        self.progress.error(format!("❌ {err}"));
        LegOutcome::Rejected(err.to_string())
    }
}

/// Limit price and order quantity for the limit path.
///
/// A BUY spends the held quote amount, so its base quantity is the held
/// amount divided by the price. A SELL offers the held base amount as is.
fn limit_order_quantity(
    side: Side,
    held: Decimal,
    reference_price: f64,
) -> Option<(Decimal, Decimal)> {
    let price = Decimal::from_f64(reference_price).filter(|p| *p > Decimal::ZERO)?;
    let quantity = match side {
        Side::Buy => held.checked_div(price)?,
        Side::Sell => held,
    };
    Some((price, quantity))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
